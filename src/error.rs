//! Error types for the library engine

use serde::Serialize;
use thiserror::Error;

/// Numeric error codes carried in protocol responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    ItemNotAvailable = 7,
    BadValue = 18,
    Divergence = 22,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A durable write failed after the in-memory catalog already changed.
    #[error("Memory and storage diverged: {0}")]
    Divergence(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wire code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::InvalidState(_) => ErrorCode::ItemNotAvailable,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Database(_) | AppError::StoreUnavailable(_) => ErrorCode::DbFailure,
            AppError::Divergence(_) => ErrorCode::Divergence,
            AppError::Authentication(_) => ErrorCode::NotAuthorized,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }

    /// True for durable-store failures of any flavour
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::StoreUnavailable(_) | AppError::Divergence(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let code = err.code();
        let message = match err {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
