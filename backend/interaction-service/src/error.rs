/// Error types for interaction-service
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use document_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The store could not be reached or timed out; the caller may retry
    #[error("Store temporarily unavailable: {0}")]
    Transient(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classify store failures by category
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transient(msg) => ServiceError::Transient(msg),
            StoreError::PermissionDenied(msg) => ServiceError::PermissionDenied(msg),
            StoreError::NotFound(msg) => ServiceError::NotFound(msg),
            StoreError::InvalidPath(msg) => ServiceError::InvalidInput(msg),
            other => ServiceError::Store(other),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl ServiceError {
    /// Returns whether the same call may succeed if retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Transient(_))
    }

    /// Stable machine-readable code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::Unauthenticated => "unauthenticated",
            ServiceError::PermissionDenied(_) => "permission_denied",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Transient(_) => "unavailable",
            ServiceError::Store(_) | ServiceError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Store(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Internal details stay in the logs
        let error = match self {
            ServiceError::Store(_) | ServiceError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error,
            code: self.code(),
        })
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
