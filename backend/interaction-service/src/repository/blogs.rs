use crate::domain::{paths, BlogCounters, BlogPost, CounterField};
use crate::error::{ServiceError, ServiceResult};
use document_store::DocumentStore;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Read access to blog records plus counter rewrites. Blog CRUD itself is
/// owned by the editor, not by this service.
#[derive(Clone)]
pub struct BlogRepository {
    store: Arc<dyn DocumentStore>,
}

impl BlogRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, blog_id: &str) -> ServiceResult<Option<BlogPost>> {
        let Some(value) = self.store.read(&paths::blog(blog_id)?).await? else {
            return Ok(None);
        };

        let mut post: BlogPost = serde_json::from_value(value).map_err(|e| {
            ServiceError::Internal(format!("Malformed blog record {}: {}", blog_id, e))
        })?;
        post.id = blog_id.to_string();
        Ok(Some(post))
    }

    pub async fn exists(&self, blog_id: &str) -> ServiceResult<bool> {
        Ok(self.store.read(&paths::blog(blog_id)?).await?.is_some())
    }

    /// Current counters, `None` when the blog does not exist
    pub async fn counters(&self, blog_id: &str) -> ServiceResult<Option<BlogCounters>> {
        Ok(self.get(blog_id).await?.map(|post| post.counters))
    }

    /// Ids of every blog in the store
    pub async fn list_ids(&self) -> ServiceResult<Vec<String>> {
        let root = self.store.read(&paths::blogs_root()?).await?;
        Ok(root
            .as_ref()
            .and_then(Value::as_object)
            .map(|blogs| blogs.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Overwrite the given counters in one update
    pub async fn write_counters(
        &self,
        blog_id: &str,
        values: &[(CounterField, i64)],
    ) -> ServiceResult<()> {
        let fields: Map<String, Value> = values
            .iter()
            .map(|(field, value)| (field.as_str().to_string(), Value::from((*value).max(0))))
            .collect();

        self.store.update(&paths::blog(blog_id)?, fields).await?;
        Ok(())
    }
}
