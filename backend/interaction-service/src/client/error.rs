use crate::error::ServiceError;
use thiserror::Error;

/// Failures as presented to a reader. `Display` is the user-facing message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InteractionError {
    /// No identity; the view should show a sign-in prompt
    #[error("Please sign in to {action}.")]
    AuthRequired { action: &'static str },

    /// The store rejected the caller; their session is likely stale
    #[error("Your session has expired. Please sign in again.")]
    Reauthenticate,

    #[error("Something went wrong. Please try again.")]
    Retryable,

    #[error("This post or comment no longer exists.")]
    NotFound,

    #[error("{0}")]
    Rejected(String),
}

impl InteractionError {
    pub fn auth_required(action: &'static str) -> Self {
        InteractionError::AuthRequired { action }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<ServiceError> for InteractionError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthenticated => InteractionError::AuthRequired {
                action: "continue",
            },
            ServiceError::PermissionDenied(_) => InteractionError::Reauthenticate,
            ServiceError::NotFound(_) => InteractionError::NotFound,
            ServiceError::InvalidInput(msg) => InteractionError::Rejected(msg),
            ServiceError::Transient(_) | ServiceError::Store(_) | ServiceError::Internal(_) => {
                InteractionError::Retryable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping() {
        assert_eq!(
            InteractionError::from(ServiceError::PermissionDenied("x".into())),
            InteractionError::Reauthenticate
        );
        assert_eq!(
            InteractionError::from(ServiceError::Transient("x".into())),
            InteractionError::Retryable
        );
        assert_eq!(
            InteractionError::from(ServiceError::NotFound("x".into())),
            InteractionError::NotFound
        );
        assert_eq!(
            InteractionError::auth_required("like this post").user_message(),
            "Please sign in to like this post."
        );
    }
}
