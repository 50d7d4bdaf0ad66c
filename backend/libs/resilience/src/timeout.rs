/// Deadlines for store calls
use std::future::Future;
use std::time::Duration;

/// The deadline passed before the operation finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timed out after {}ms", .after.as_millis())]
pub struct Elapsed {
    pub after: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    #[error(transparent)]
    Elapsed(#[from] Elapsed),
    #[error("{0}")]
    OperationFailed(E),
}

/// Run `future` with a deadline. The future is dropped when it expires.
pub async fn with_timeout<F, T>(after: Duration, future: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(after, future)
        .await
        .map_err(|_| Elapsed { after })
}

/// [`with_timeout`] for fallible operations, folding both failures into
/// one error.
pub async fn with_timeout_result<F, T, E>(after: Duration, future: F) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    with_timeout(after, future)
        .await?
        .map_err(TimeoutError::OperationFailed)
}
