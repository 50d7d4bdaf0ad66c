use crate::domain::{paths, RelationKind, RelationRecord};
use crate::error::{ServiceError, ServiceResult};
use document_store::DocumentStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Repository for like and save relations at `{likes|saves}/{blogId}/{userId}`
#[derive(Clone)]
pub struct RelationRepository {
    store: Arc<dyn DocumentStore>,
    kind: RelationKind,
}

impl RelationRepository {
    pub fn new(store: Arc<dyn DocumentStore>, kind: RelationKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub async fn get(&self, blog_id: &str, user_id: &str) -> ServiceResult<Option<RelationRecord>> {
        let path = paths::relation(self.kind, blog_id, user_id)?;
        match self.store.read(&path).await? {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                ServiceError::Internal(format!("Malformed {} record at {}: {}", self.kind, path, e))
            }),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, blog_id: &str, user_id: &str) -> ServiceResult<bool> {
        let path = paths::relation(self.kind, blog_id, user_id)?;
        Ok(self.store.read(&path).await?.is_some())
    }

    pub async fn create(&self, blog_id: &str, record: &RelationRecord) -> ServiceResult<()> {
        let path = paths::relation(self.kind, blog_id, &record.user_id)?;
        let value = serde_json::to_value(record)
            .map_err(|e| ServiceError::Internal(format!("Failed to encode relation: {}", e)))?;
        self.store.write(&path, value).await?;
        Ok(())
    }

    pub async fn delete(&self, blog_id: &str, user_id: &str) -> ServiceResult<()> {
        let path = paths::relation(self.kind, blog_id, user_id)?;
        self.store.remove(&path).await?;
        Ok(())
    }

    /// Relations on a blog, newest first
    pub async fn list(&self, blog_id: &str) -> ServiceResult<Vec<RelationRecord>> {
        let path = paths::relations(self.kind, blog_id)?;
        let Some(Value::Object(children)) = self.store.read(&path).await? else {
            return Ok(Vec::new());
        };

        let mut records: Vec<RelationRecord> = children
            .into_iter()
            .filter_map(|(user_id, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(kind = %self.kind, blog_id, user_id = %user_id, error = %e, "Skipping malformed relation");
                    None
                }
            })
            .collect();

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(records)
    }

    /// Number of child keys under the blog, well-formed or not
    pub async fn count(&self, blog_id: &str) -> ServiceResult<i64> {
        let path = paths::relations(self.kind, blog_id)?;
        Ok(match self.store.read(&path).await? {
            Some(Value::Object(children)) => children.len() as i64,
            _ => 0,
        })
    }

    /// Blogs on which `user_id` holds this relation
    pub async fn blogs_for_user(&self, user_id: &str) -> ServiceResult<Vec<String>> {
        let root = self.store.read(&paths::relation_root(self.kind)?).await?;
        let Some(Value::Object(blogs)) = root else {
            return Ok(Vec::new());
        };

        let mut blog_ids: Vec<String> = blogs
            .into_iter()
            .filter(|(_, users)| users.get(user_id).is_some())
            .map(|(blog_id, _)| blog_id)
            .collect();
        blog_ids.sort();
        Ok(blog_ids)
    }
}
