use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::bootstrap::BootstrapError;

/// Unified error type for the Stardust application
#[derive(Error, Debug)]
pub enum StardustError {
    // Registry errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Proxy group {group_id} has no members")]
    EmptyGroup { group_id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Bootstrap sub-action errors
    #[error("Proxy unavailable: {0}")]
    ProxyUnavailable(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Driver error: {0}")]
    DriverError(String),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),

    // RPC transport errors
    #[error("RPC error: {0}")]
    Rpc(String),

    // Authentication errors
    #[error("Authentication failed")]
    AuthenticationFailed,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Operation timed out")]
    Timeout,

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Stardust operations
pub type Result<T> = std::result::Result<T, StardustError>;

impl StardustError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            StardustError::InvalidArgument(_)
            | StardustError::InvalidRequest(_)
            | StardustError::InvalidConfig(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            StardustError::AuthenticationFailed => StatusCode::UNAUTHORIZED,

            // 404 Not Found
            StardustError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict: the group exists but cannot serve a pick
            StardustError::EmptyGroup { .. } => StatusCode::CONFLICT,

            // 502 Bad Gateway: a bootstrap collaborator failed
            StardustError::Bootstrap(_)
            | StardustError::ProxyUnavailable(_)
            | StardustError::StorageError(_)
            | StardustError::DriverError(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            StardustError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,

            // 504 Gateway Timeout
            StardustError::Timeout => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            StardustError::Database(_)
            | StardustError::Rpc(_)
            | StardustError::Io(_)
            | StardustError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

// Implement IntoResponse for API error responses
impl IntoResponse for StardustError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            // Bootstrap failures carry per-action detail the caller needs
            StardustError::Bootstrap(err) => json!({
                "error": self.to_string(),
                "failed_actions": err.failed_actions(),
            }),
            _ => json!({
                "error": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{BootstrapError, BootstrapFailure};

    #[test]
    fn test_error_status_code_mapping() {
        assert_eq!(
            StardustError::InvalidArgument("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StardustError::InvalidRequest("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            StardustError::AuthenticationFailed.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            StardustError::NotFound("group 9".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StardustError::EmptyGroup {
                group_id: "default".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            StardustError::Timeout.status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            StardustError::DatabaseConnection("refused".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_bootstrap_error_status_code() {
        let err = StardustError::Bootstrap(BootstrapError::new(vec![
            BootstrapFailure::StorageError("insert failed".to_string()),
        ]));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_error_client_server_helpers() {
        assert!(StardustError::InvalidRequest("bad".to_string()).is_client_error());
        assert!(!StardustError::InvalidRequest("bad".to_string()).is_server_error());

        assert!(StardustError::Internal("boom".to_string()).is_server_error());
        assert!(!StardustError::Internal("boom".to_string()).is_client_error());
    }
}
