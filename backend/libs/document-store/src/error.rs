//! Error types for document store operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Network, timeout or backend unavailability; safe to retry
    #[error("Transient store failure: {0}")]
    Transient(String),

    /// The store rejected the operation for the caller's identity
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Optional capability the backend does not provide
    #[error("Operation not supported by this store: {0}")]
    Unsupported(&'static str),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Value at the path has the wrong shape for the operation
    #[error("Invalid value at {path}: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, StoreError::Unsupported(_))
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
