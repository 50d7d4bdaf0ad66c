use super::counters::CounterMaintainer;
use crate::domain::CounterField;
use resilience::with_timeout;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

pub const DEFAULT_VIEW_TIMEOUT: Duration = Duration::from_secs(5);

/// Best-effort view counting for blog detail loads
///
/// Views go through the same maintainer as the relation counters, so an
/// atomic increment is used where the store has one and a compare-and-swap
/// loop otherwise. Failures are logged and swallowed.
#[derive(Clone)]
pub struct ViewCounter {
    counters: CounterMaintainer,
    timeout: Duration,
}

impl ViewCounter {
    pub fn new(counters: CounterMaintainer, timeout: Duration) -> Self {
        Self { counters, timeout }
    }

    /// Count one view. Returns the new total when it is known; never fails.
    pub async fn increment_views(&self, blog_id: &str) -> Option<i64> {
        match with_timeout(
            self.timeout,
            self.counters.increment(blog_id, CounterField::Views),
        )
        .await
        {
            Ok(Ok(views)) => views,
            Ok(Err(e)) => {
                warn!(blog_id, error = %e, "Failed to increment views");
                None
            }
            Err(e) => {
                warn!(blog_id, error = %e, "View increment timed out");
                None
            }
        }
    }

    /// Fire-and-forget variant for callers that must not wait
    pub fn spawn_increment(&self, blog_id: impl Into<String>) -> JoinHandle<Option<i64>> {
        let views = self.clone();
        let blog_id = blog_id.into();
        tokio::spawn(async move { views.increment_views(&blog_id).await })
    }
}
