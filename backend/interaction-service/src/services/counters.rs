use crate::domain::models::count_of;
use crate::domain::{paths, BlogCounters, CounterField, RelationKind};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{BlogRepository, CommentRepository, RelationRepository};
use document_store::{DocumentStore, StoreError, StorePath};
use resilience::{with_retry_if, RetryConfig, RetryError};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maintains the aggregate counters on `blogs/{blogId}`
///
/// Strategy per update:
/// - positive deltas use the store's atomic increment when available; a
///   counter that was already below 0 is rewritten by compare-and-swap
///   from a base of 0
/// - otherwise (and for every decrement) a compare-and-swap loop with
///   exponential backoff, clamping at 0
/// - stores with neither primitive get a plain read-then-write
///
/// A blog that does not exist is never given counters. Losing the
/// compare-and-swap race on every attempt is treated as drift: it is logged
/// and left to [`CounterMaintainer::reconcile`].
#[derive(Clone)]
pub struct CounterMaintainer {
    store: Arc<dyn DocumentStore>,
    blogs: BlogRepository,
    retry: RetryConfig,
}

#[derive(Debug)]
enum SwapFailure {
    Conflict,
    Store(StoreError),
}

impl std::fmt::Display for SwapFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapFailure::Conflict => f.write_str("counter changed concurrently"),
            SwapFailure::Store(e) => write!(f, "{}", e),
        }
    }
}

/// Outcome of a reconciliation sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub scanned: usize,
    pub repaired: usize,
    pub failed: usize,
}

impl CounterMaintainer {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryConfig) -> Self {
        Self {
            blogs: BlogRepository::new(store.clone()),
            store,
            retry,
        }
    }

    pub async fn increment(&self, blog_id: &str, field: CounterField) -> ServiceResult<Option<i64>> {
        self.adjust(blog_id, field, 1).await
    }

    pub async fn decrement(&self, blog_id: &str, field: CounterField) -> ServiceResult<Option<i64>> {
        self.adjust(blog_id, field, -1).await
    }

    /// Apply `delta` to a counter. Returns the new value, or `None` when the
    /// blog does not exist or the update was abandoned as drift.
    pub async fn adjust(
        &self,
        blog_id: &str,
        field: CounterField,
        delta: i64,
    ) -> ServiceResult<Option<i64>> {
        if !self.blogs.exists(blog_id).await? {
            debug!(blog_id, field = %field, "Blog not found, counter left alone");
            return Ok(None);
        }

        let path = paths::blog_counter(blog_id, field)?;
        if delta == 0 {
            return Ok(Some(
                self.store.read(&path).await?.as_ref().map(count_of).unwrap_or(0),
            ));
        }

        if delta > 0 {
            match self.store.atomic_increment(&path, delta).await {
                Ok(value) if value - delta >= 0 => return Ok(Some(value)),
                Ok(value) => {
                    warn!(blog_id, field = %field, before = value - delta, "Counter was negative, rewriting");
                }
                Err(e) if e.is_unsupported() => {
                    debug!(blog_id, field = %field, "Atomic increment unavailable, using compare-and-swap");
                }
                Err(StoreError::InvalidValue { reason, .. }) => {
                    warn!(blog_id, field = %field, reason = %reason, "Counter holds a non-integer, rewriting");
                }
                Err(e) => return Err(e.into()),
            }
        }

        match self.compare_and_swap(&path, delta).await {
            Ok(value) => Ok(Some(value)),
            Err(RetryError::OperationFailed(SwapFailure::Store(e))) if e.is_unsupported() => {
                self.read_modify_write(&path, delta).await.map(Some)
            }
            Err(RetryError::OperationFailed(SwapFailure::Store(e))) => Err(e.into()),
            Err(RetryError::OperationFailed(SwapFailure::Conflict))
            | Err(RetryError::MaxRetriesExceeded { .. }) => {
                warn!(
                    blog_id,
                    field = %field,
                    delta,
                    retries = self.retry.max_retries,
                    "Counter update abandoned under contention, counter has drifted"
                );
                Ok(None)
            }
        }
    }

    async fn compare_and_swap(
        &self,
        path: &StorePath,
        delta: i64,
    ) -> Result<i64, RetryError<SwapFailure>> {
        let store = &self.store;

        with_retry_if(
            self.retry.clone(),
            || {
                let store = store.clone();
                let path = path.clone();
                async move {
                    let current = store.read(&path).await.map_err(SwapFailure::Store)?;
                    let before = current.as_ref().map(count_of).unwrap_or(0);
                    let next = (before + delta).max(0);
                    if next == before {
                        return Ok(before);
                    }

                    match store.compare_and_set(&path, current, Value::from(next)).await {
                        Ok(true) => Ok(next),
                        Ok(false) => Err(SwapFailure::Conflict),
                        Err(e) => Err(SwapFailure::Store(e)),
                    }
                }
            },
            |e| matches!(e, SwapFailure::Conflict),
        )
        .await
    }

    /// Last resort for stores without atomic primitives. Concurrent updates
    /// may be lost.
    async fn read_modify_write(&self, path: &StorePath, delta: i64) -> ServiceResult<i64> {
        debug!(path = %path, delta, "Falling back to read-then-write counter update");

        let before = self.store.read(path).await?.as_ref().map(count_of).unwrap_or(0);
        let next = (before + delta).max(0);
        if next != before {
            self.store.write(path, Value::from(next)).await?;
        }
        Ok(next)
    }

    /// Recount the relations of one blog and rewrite `likes`, `savesCount`
    /// and `commentsCount` if they drifted. `views` has no backing relation
    /// and is left untouched.
    pub async fn reconcile(&self, blog_id: &str) -> ServiceResult<BlogCounters> {
        let before = self
            .blogs
            .counters(blog_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("blog {}", blog_id)))?;

        let mut after = before;
        let mut repairs = Vec::new();
        for field in CounterField::ALL.into_iter().filter(CounterField::is_relation_counter) {
            let actual = self.recount(blog_id, field).await?;
            if before.get(field) != actual {
                after.set(field, actual);
                repairs.push((field, actual));
            }
        }

        if !repairs.is_empty() {
            info!(
                blog_id,
                likes_before = before.likes,
                likes_after = after.likes,
                saves_before = before.saves_count,
                saves_after = after.saves_count,
                comments_before = before.comments_count,
                comments_after = after.comments_count,
                "Repairing counter drift"
            );
            self.blogs.write_counters(blog_id, &repairs).await?;
        }

        Ok(after)
    }

    /// Number of child records backing a relation counter
    async fn recount(&self, blog_id: &str, field: CounterField) -> ServiceResult<i64> {
        match field {
            CounterField::Likes => {
                RelationRepository::new(self.store.clone(), RelationKind::Like)
                    .count(blog_id)
                    .await
            }
            CounterField::SavesCount => {
                RelationRepository::new(self.store.clone(), RelationKind::Save)
                    .count(blog_id)
                    .await
            }
            CounterField::CommentsCount => {
                CommentRepository::new(self.store.clone()).count(blog_id).await
            }
            CounterField::Views => Err(ServiceError::Internal(
                "views has no backing relation".to_string(),
            )),
        }
    }

    /// Reconcile every blog; failures are logged and counted, not returned.
    pub async fn reconcile_all(&self) -> ServiceResult<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for blog_id in self.blogs.list_ids().await? {
            report.scanned += 1;
            let before = self.blogs.counters(&blog_id).await.ok().flatten();

            match self.reconcile(&blog_id).await {
                Ok(after) if before.as_ref() != Some(&after) => report.repaired += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!(blog_id = %blog_id, error = %e, "Failed to reconcile counters");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
