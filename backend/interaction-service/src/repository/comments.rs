use crate::domain::{paths, Comment};
use crate::error::{ServiceError, ServiceResult};
use document_store::DocumentStore;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::warn;

/// Repository for comments at `comments/{blogId}/{commentId}`
#[derive(Clone)]
pub struct CommentRepository {
    store: Arc<dyn DocumentStore>,
}

impl CommentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Reserve a fresh key for a new comment on `blog_id`
    pub async fn allocate_id(&self, blog_id: &str) -> ServiceResult<String> {
        Ok(self.store.push(&paths::comments(blog_id)?).await?)
    }

    pub async fn insert(&self, blog_id: &str, comment: &Comment) -> ServiceResult<()> {
        let record = comment
            .to_record()
            .map_err(|e| ServiceError::Internal(format!("Failed to encode comment: {}", e)))?;
        self.store
            .write(&paths::comment(blog_id, &comment.id)?, record)
            .await?;
        Ok(())
    }

    pub async fn get(&self, blog_id: &str, comment_id: &str) -> ServiceResult<Option<Comment>> {
        let path = paths::comment(blog_id, comment_id)?;
        match self.store.read(&path).await? {
            Some(value) => parse_comment(comment_id, value).map(Some).map_err(|e| {
                ServiceError::Internal(format!("Malformed comment at {}: {}", path, e))
            }),
            None => Ok(None),
        }
    }

    /// Rewrite the text and mark the comment edited
    pub async fn update_text(
        &self,
        blog_id: &str,
        comment_id: &str,
        text: &str,
        updated_at: i64,
    ) -> ServiceResult<()> {
        let mut fields = Map::new();
        fields.insert("text".to_string(), json!(text));
        fields.insert("updatedAt".to_string(), json!(updated_at));
        fields.insert("isEdited".to_string(), json!(true));

        self.store
            .update(&paths::comment(blog_id, comment_id)?, fields)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, blog_id: &str, comment_id: &str) -> ServiceResult<()> {
        self.store
            .remove(&paths::comment(blog_id, comment_id)?)
            .await?;
        Ok(())
    }

    /// Comments on a blog, newest first
    pub async fn list(&self, blog_id: &str) -> ServiceResult<Vec<Comment>> {
        let value = self.store.read(&paths::comments(blog_id)?).await?;
        Ok(materialize(value))
    }

    pub async fn count(&self, blog_id: &str) -> ServiceResult<i64> {
        Ok(match self.store.read(&paths::comments(blog_id)?).await? {
            Some(Value::Object(children)) => children.len() as i64,
            _ => 0,
        })
    }
}

fn parse_comment(id: &str, value: Value) -> Result<Comment, serde_json::Error> {
    let mut comment: Comment = serde_json::from_value(value)?;
    comment.id = id.to_string();
    Ok(comment)
}

/// Turn a `comments/{blogId}` subtree into a list sorted newest first. An
/// absent subtree yields an empty list.
pub fn materialize(subtree: Option<Value>) -> Vec<Comment> {
    let Some(Value::Object(children)) = subtree else {
        return Vec::new();
    };

    let mut comments: Vec<Comment> = children
        .into_iter()
        .filter_map(|(id, value)| match parse_comment(&id, value) {
            Ok(comment) => Some(comment),
            Err(e) => {
                warn!(comment_id = %id, error = %e, "Skipping malformed comment");
                None
            }
        })
        .collect();

    sort_newest_first(&mut comments);
    comments
}

/// Order by `createdAt` descending, ties broken by key
pub fn sort_newest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_sorts_newest_first() {
        let comments = materialize(Some(json!({
            "a": {"text": "old", "userId": "u1", "userName": "A", "createdAt": 1},
            "c": {"text": "new", "userId": "u2", "userName": "B", "createdAt": 30},
            "b": {"text": "mid", "userId": "u1", "userName": "A", "createdAt": 20},
            "z": {"text": "tie", "userId": "u3", "userName": "C", "createdAt": 20}
        })));

        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "z", "b", "a"]);
    }

    #[test]
    fn test_materialize_absent_and_malformed() {
        assert!(materialize(None).is_empty());

        let comments = materialize(Some(json!({
            "ok": {"text": "fine", "userId": "u1", "userName": "A", "createdAt": 1},
            "bad": {"text": 42}
        })));
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, "ok");
    }
}
