/// Resilience patterns shared by services
///
/// - **Retry**: Exponential backoff with jitter, optionally filtered by a
///   retry predicate (used for compare-and-swap contention loops)
/// - **Timeout**: Enforces time limits on store calls while keeping the
///   operation's own error type
///
/// # Example: Compare-and-swap loop
///
/// ```rust,no_run
/// use resilience::{with_retry_if, RetryConfig};
/// use std::time::Duration;
///
/// #[derive(Debug)]
/// enum SwapError { Conflict, Fatal }
///
/// impl std::fmt::Display for SwapError {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{:?}", self)
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let config = RetryConfig::contention(5, Duration::from_millis(10));
///
///     let result = with_retry_if(
///         config,
///         || async { Ok::<_, SwapError>(()) },
///         |e| matches!(e, SwapError::Conflict),
///     )
///     .await;
/// }
/// ```

pub mod retry;
pub mod timeout;

pub use retry::{with_retry, with_retry_if, Backoff, RetryConfig, RetryError};
pub use timeout::{with_timeout, with_timeout_result, Elapsed, TimeoutError};
