/// Retry loops for optimistic concurrency
///
/// A compare-and-swap that loses a race is retried after a short,
/// exponentially growing, jittered pause. Anything the predicate rejects
/// ends the loop at once.
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first one
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Upper bound for a single pause
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Spread each pause by ±30% so racing writers fall out of step
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::contention(5, Duration::from_millis(10))
    }
}

impl RetryConfig {
    /// Tight loop for compare-and-swap contention on a hot counter
    pub fn contention(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            max_backoff: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Pauses between attempts, in order
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_backoff,
            max: self.max_backoff,
            multiplier: self.backoff_multiplier,
            jitter: self.jitter,
        }
    }
}

/// Endless schedule of pauses produced by [`RetryConfig::backoff`]
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    multiplier: f64,
    jitter: bool,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let base = self.next.min(self.max);
        self.next = base.mul_f64(self.multiplier.max(1.0)).min(self.max);

        if !self.jitter {
            return Some(base);
        }
        let factor = rand::thread_rng().gen_range(0.7..1.3);
        Some(base.mul_f64(factor))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every attempt lost; carries the last error
    #[error("gave up after {retries} retries: {last}")]
    MaxRetriesExceeded { retries: u32, last: E },
    /// The predicate refused to retry this error
    #[error("{0}")]
    OperationFailed(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::MaxRetriesExceeded { last, .. } => last,
            RetryError::OperationFailed(e) => e,
        }
    }
}

/// Run `attempt` until it succeeds, `should_retry` rejects its error, or
/// the retry budget is spent.
pub async fn with_retry_if<F, Fut, T, E, P>(
    config: RetryConfig,
    mut attempt: F,
    should_retry: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut pauses = config.backoff();
    let mut retries = 0;

    loop {
        let error = match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if !should_retry(&e) => return Err(RetryError::OperationFailed(e)),
            Err(e) => e,
        };

        if retries == config.max_retries {
            return Err(RetryError::MaxRetriesExceeded {
                retries,
                last: error,
            });
        }
        retries += 1;

        let pause = pauses.next().unwrap_or(config.max_backoff);
        debug!(
            error = %error,
            retry = retries,
            max_retries = config.max_retries,
            pause_ms = pause.as_millis() as u64,
            "Retrying after conflict"
        );
        tokio::time::sleep(pause).await;
    }
}

/// [`with_retry_if`] that retries every error
pub async fn with_retry<F, Fut, T, E>(config: RetryConfig, attempt: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(config, attempt, |_| true).await
}
