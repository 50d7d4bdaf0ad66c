//! Store layout
//!
//! ```text
//! blogs/{blogId}                     blog record with counters
//! likes/{blogId}/{userId}            RelationRecord
//! saves/{blogId}/{userId}            RelationRecord
//! comments/{blogId}/{commentId}      Comment (without id)
//! ```

use super::models::{CounterField, RelationKind};
use document_store::{StorePath, StoreResult};

pub const BLOGS: &str = "blogs";
pub const COMMENTS: &str = "comments";

pub fn blogs_root() -> StoreResult<StorePath> {
    StorePath::from_segments([BLOGS])
}

pub fn blog(blog_id: &str) -> StoreResult<StorePath> {
    StorePath::from_segments([BLOGS, blog_id])
}

pub fn blog_counter(blog_id: &str, field: CounterField) -> StoreResult<StorePath> {
    StorePath::from_segments([BLOGS, blog_id, field.as_str()])
}

pub fn relation_root(kind: RelationKind) -> StoreResult<StorePath> {
    StorePath::from_segments([kind.collection()])
}

pub fn relations(kind: RelationKind, blog_id: &str) -> StoreResult<StorePath> {
    StorePath::from_segments([kind.collection(), blog_id])
}

pub fn relation(kind: RelationKind, blog_id: &str, user_id: &str) -> StoreResult<StorePath> {
    StorePath::from_segments([kind.collection(), blog_id, user_id])
}

pub fn comments(blog_id: &str) -> StoreResult<StorePath> {
    StorePath::from_segments([COMMENTS, blog_id])
}

pub fn comment(blog_id: &str, comment_id: &str) -> StoreResult<StorePath> {
    StorePath::from_segments([COMMENTS, blog_id, comment_id])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(
            blog_counter("b1", CounterField::SavesCount).unwrap().to_string(),
            "blogs/b1/savesCount"
        );
        assert_eq!(
            relation(RelationKind::Like, "b1", "u1").unwrap().to_string(),
            "likes/b1/u1"
        );
        assert_eq!(comment("b1", "c1").unwrap().to_string(), "comments/b1/c1");
    }

    #[test]
    fn test_rejects_ids_that_escape_their_segment() {
        assert!(blog("a/b").is_err());
        assert!(blog("").is_err());
        assert!(relation(RelationKind::Save, "b1", "user.name").is_err());
    }
}
