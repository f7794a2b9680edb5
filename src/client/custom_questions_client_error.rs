use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum CustomQuestionsClientError {
    #[error("Http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Api error: {0} - {1}")]
    ApiError(StatusCode, String),

    #[error("Failed to serialize object: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CustomQuestionsClientError {
    /// Text fit for an error banner: the server's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            CustomQuestionsClientError::ApiError(_, message) => message.clone(),
            other => other.to_string(),
        }
    }
}
