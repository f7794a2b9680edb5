use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),

    #[error("Sqlx failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::Json(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) | ServerError::Sqlx(_) | ServerError::Migrate(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            ServerError::Sqlx(_) | ServerError::Migrate(_) => "internal_error".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ServerError::Validation("title is required".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "title is required");
    }

    #[test]
    fn database_errors_hide_details() {
        let err = ServerError::Sqlx(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "internal_error");
    }

    #[test]
    fn malformed_json_is_a_bad_request() {
        let err = ServerError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.client_message().starts_with("Json error"));
    }
}
