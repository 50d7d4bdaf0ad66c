use super::subscriptions::LiveFeed;
use crate::domain::{paths, BlogCounters};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::BlogRepository;
use document_store::DocumentStore;
use serde_json::Value;
use std::sync::Arc;

/// Read-only view of a blog's counters, one-shot or live
#[derive(Clone)]
pub struct BlogStatsService {
    store: Arc<dyn DocumentStore>,
    blogs: BlogRepository,
}

impl BlogStatsService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            blogs: BlogRepository::new(store.clone()),
            store,
        }
    }

    pub async fn get(&self, blog_id: &str) -> ServiceResult<BlogCounters> {
        self.blogs
            .counters(blog_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("blog {}", blog_id)))
    }

    /// Deliver `{views, likes, commentsCount, savesCount}` now and on every
    /// change to the blog record. A missing blog reads as all zeros.
    pub fn subscribe<C>(&self, blog_id: &str, callback: C) -> ServiceResult<LiveFeed>
    where
        C: FnMut(BlogCounters) + Send + 'static,
    {
        LiveFeed::spawn(
            self.store.clone(),
            paths::blog(blog_id)?,
            counters_of,
            callback,
        )
    }
}

fn counters_of(record: Option<Value>) -> BlogCounters {
    record
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}
