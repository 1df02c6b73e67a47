use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

/// Store-level failures, translated into the `{success:false, message}`
/// envelope by the request layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("Username already taken")]
    Conflict,
    #[error("User not found")]
    NotFound,
    #[error("Invalid password")]
    Auth,
    #[error("failed to persist accounts: {0}")]
    Persistence(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::Validation(_) | StoreError::Conflict => StatusCode::BAD_REQUEST,
            StoreError::Auth => StatusCode::UNAUTHORIZED,
            StoreError::NotFound => StatusCode::NOT_FOUND,
            StoreError::Persistence(_) | StoreError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Internal details never leave the process.
    pub fn message(&self) -> String {
        match self {
            StoreError::Persistence(_) | StoreError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn envelope(&self) -> Json<serde_json::Value> {
        Json(serde_json::json!({ "success": false, "message": self.message() }))
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "store error");
        }
        (status, self.envelope()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_error_kinds() {
        assert_eq!(
            StoreError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(StoreError::Conflict.status(), StatusCode::BAD_REQUEST);
        assert_eq!(StoreError::Auth.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(StoreError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            StoreError::Persistence("disk full".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = StoreError::Persistence("/etc/secret: permission denied".into());
        assert_eq!(err.message(), "Internal server error");
    }
}
