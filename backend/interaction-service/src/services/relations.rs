use super::counters::CounterMaintainer;
use crate::domain::{clock, Identity, RelationKind, RelationRecord, ToggleOutcome};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{BlogRepository, RelationRepository};
use document_store::DocumentStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Like and save toggles
///
/// The relation record is the source of truth; the parent counter is
/// maintained after the record changes and may briefly lag behind it.
#[derive(Clone)]
pub struct RelationService {
    relations: RelationRepository,
    blogs: BlogRepository,
    counters: CounterMaintainer,
}

impl RelationService {
    pub fn new(store: Arc<dyn DocumentStore>, kind: RelationKind, counters: CounterMaintainer) -> Self {
        Self {
            relations: RelationRepository::new(store.clone(), kind),
            blogs: BlogRepository::new(store),
            counters,
        }
    }

    pub fn likes(store: Arc<dyn DocumentStore>, counters: CounterMaintainer) -> Self {
        Self::new(store, RelationKind::Like, counters)
    }

    pub fn saves(store: Arc<dyn DocumentStore>, counters: CounterMaintainer) -> Self {
        Self::new(store, RelationKind::Save, counters)
    }

    pub fn kind(&self) -> RelationKind {
        self.relations.kind()
    }

    /// Flip the caller's relation with `blog_id` and return the new state.
    ///
    /// Activating requires the blog to exist. Deactivating always succeeds
    /// once the record is gone, even if the blog has since been removed.
    pub async fn toggle(&self, blog_id: &str, identity: &Identity) -> ServiceResult<ToggleOutcome> {
        let kind = self.kind();
        let field = kind.counter();
        let user_id = identity.user_id.as_str();

        let active = if self.relations.exists(blog_id, user_id).await? {
            self.relations.delete(blog_id, user_id).await?;
            false
        } else {
            if !self.blogs.exists(blog_id).await? {
                return Err(ServiceError::NotFound(format!("blog {}", blog_id)));
            }
            let record = RelationRecord {
                user_id: user_id.to_string(),
                user_email: identity.email.clone(),
                created_at: clock::now_millis(),
            };
            self.relations.create(blog_id, &record).await?;
            true
        };

        // The relation already changed; a failed counter update is drift.
        let delta = if active { 1 } else { -1 };
        let count = match self.counters.adjust(blog_id, field, delta).await {
            Ok(count) => count,
            Err(e) => {
                warn!(blog_id, user_id, field = %field, error = %e, "Counter update failed after toggle");
                None
            }
        };

        info!(blog_id, user_id, kind = %kind, active, "Relation toggled");
        Ok(ToggleOutcome { active, count })
    }

    pub async fn has_relation(&self, blog_id: &str, user_id: &str) -> ServiceResult<bool> {
        self.relations.exists(blog_id, user_id).await
    }

    /// Relations on a blog, newest first
    pub async fn list_relations(&self, blog_id: &str) -> ServiceResult<Vec<RelationRecord>> {
        self.relations.list(blog_id).await
    }

    /// Blogs on which `user_id` holds this relation, e.g. a reader's saved
    /// posts
    pub async fn blogs_for_user(&self, user_id: &str) -> ServiceResult<Vec<String>> {
        self.relations.blogs_for_user(user_id).await
    }
}
