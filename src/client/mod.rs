pub mod custom_questions_client;
pub mod custom_questions_client_error;
