use super::counters::CounterMaintainer;
use super::subscriptions::LiveFeed;
use crate::domain::{clock, paths, Comment, CounterField, Identity};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::comments::materialize;
use crate::repository::{BlogRepository, CommentRepository};
use document_store::DocumentStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

pub const MAX_COMMENT_CHARS: usize = 5000;

/// Body of a new or edited comment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, max = 5000, message = "comment text must be between 1 and 5000 characters"))]
    pub text: String,
}

impl CommentInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Trimmed text, rejected when blank or too long
    pub fn normalized(&self) -> ServiceResult<String> {
        let input = CommentInput::new(self.text.trim());
        input.validate()?;
        Ok(input.text)
    }
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn DocumentStore>,
    comments: CommentRepository,
    blogs: BlogRepository,
    counters: CounterMaintainer,
}

impl CommentService {
    pub fn new(store: Arc<dyn DocumentStore>, counters: CounterMaintainer) -> Self {
        Self {
            comments: CommentRepository::new(store.clone()),
            blogs: BlogRepository::new(store.clone()),
            store,
            counters,
        }
    }

    /// Post a comment as `author`, then bump `commentsCount`.
    pub async fn add(
        &self,
        blog_id: &str,
        input: &CommentInput,
        author: &Identity,
    ) -> ServiceResult<Comment> {
        let text = input.normalized()?;

        if !self.blogs.exists(blog_id).await? {
            return Err(ServiceError::NotFound(format!("blog {}", blog_id)));
        }

        let comment = Comment {
            id: self.comments.allocate_id(blog_id).await?,
            text,
            user_id: author.user_id.clone(),
            user_name: author.display_name().to_string(),
            user_email: author.email.clone(),
            user_photo: author.photo.clone(),
            created_at: clock::now_millis(),
            updated_at: None,
            is_edited: false,
        };
        self.comments.insert(blog_id, &comment).await?;

        if let Err(e) = self
            .counters
            .increment(blog_id, CounterField::CommentsCount)
            .await
        {
            warn!(blog_id, comment_id = %comment.id, error = %e, "Comment count not incremented");
        }

        info!(blog_id, comment_id = %comment.id, user_id = %comment.user_id, "Comment added");
        Ok(comment)
    }

    /// Replace the text of the caller's own comment.
    pub async fn update(
        &self,
        blog_id: &str,
        comment_id: &str,
        input: &CommentInput,
        editor: &Identity,
    ) -> ServiceResult<Comment> {
        let text = input.normalized()?;

        let existing = self
            .comments
            .get(blog_id, comment_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("comment {}", comment_id)))?;

        if existing.user_id != editor.user_id {
            return Err(ServiceError::PermissionDenied(
                "only the author may edit a comment".to_string(),
            ));
        }

        let updated_at =
            clock::now_after(existing.updated_at.unwrap_or(0).max(existing.created_at));
        self.comments
            .update_text(blog_id, comment_id, &text, updated_at)
            .await?;

        info!(blog_id, comment_id, "Comment edited");
        Ok(Comment {
            text,
            updated_at: Some(updated_at),
            is_edited: true,
            ..existing
        })
    }

    /// Remove a comment and decrement `commentsCount`. Deleting a comment
    /// that does not exist succeeds without touching the counter; the
    /// return value tells whether anything was removed.
    pub async fn delete(&self, blog_id: &str, comment_id: &str) -> ServiceResult<bool> {
        if self.comments.get(blog_id, comment_id).await?.is_none() {
            return Ok(false);
        }

        self.comments.delete(blog_id, comment_id).await?;

        if let Err(e) = self
            .counters
            .decrement(blog_id, CounterField::CommentsCount)
            .await
        {
            warn!(blog_id, comment_id, error = %e, "Comment count not decremented");
        }

        info!(blog_id, comment_id, "Comment deleted");
        Ok(true)
    }

    /// Comments on a blog, newest first
    pub async fn list(&self, blog_id: &str) -> ServiceResult<Vec<Comment>> {
        self.comments.list(blog_id).await
    }

    pub async fn get(&self, blog_id: &str, comment_id: &str) -> ServiceResult<Option<Comment>> {
        self.comments.get(blog_id, comment_id).await
    }

    /// Deliver the full sorted comment list now and after every change.
    /// The returned handle must be passed to [`CommentService::unsubscribe`]
    /// (or dropped) when the view goes away.
    pub fn subscribe<C>(&self, blog_id: &str, callback: C) -> ServiceResult<LiveFeed>
    where
        C: FnMut(Vec<Comment>) + Send + 'static,
    {
        LiveFeed::spawn(
            self.store.clone(),
            paths::comments(blog_id)?,
            materialize,
            callback,
        )
    }

    pub fn unsubscribe(&self, feed: LiveFeed) {
        feed.unsubscribe();
    }
}
