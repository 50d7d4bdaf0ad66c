//! Comment lifecycle, ordering and live delivery

mod common;

use common::{context, eventually, read, seeded_store, user};
use document_store::{DocumentStore, StorePath};
use interaction_service::domain::Comment;
use interaction_service::services::CommentInput;
use interaction_service::ServiceError;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn is_newest_first(comments: &[Comment]) -> bool {
    comments
        .windows(2)
        .all(|pair| pair[0].created_at > pair[1].created_at)
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let author = user("u1");
    let comments = ctx.for_caller(Some(author.clone())).comments;

    for text in ["first", "second", "third"] {
        comments
            .add("b1", &CommentInput::new(text), &author)
            .await
            .unwrap();
    }

    let listed = comments.list("b1").await.unwrap();
    let texts: Vec<_> = listed.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["third", "second", "first"]);
    assert!(is_newest_first(&listed));
    assert_eq!(read(&store, "blogs/b1/commentsCount").await, Some(json!(3)));
}

#[tokio::test]
async fn test_add_records_author_snapshot() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let author = user("u1").with_photo("https://img.example.com/u1.png");

    let comment = ctx
        .for_caller(Some(author.clone()))
        .comments
        .add("b1", &CommentInput::new("  nice post  "), &author)
        .await
        .unwrap();

    assert_eq!(comment.text, "nice post");
    assert_eq!(comment.user_name, "User u1");
    assert!(!comment.is_edited);
    assert_eq!(comment.updated_at, None);

    let stored = read(&store, &format!("comments/b1/{}", comment.id))
        .await
        .unwrap();
    assert_eq!(stored["userId"], json!("u1"));
    assert_eq!(stored["userPhoto"], json!("https://img.example.com/u1.png"));
    assert_eq!(stored["isEdited"], json!(false));
}

#[tokio::test]
async fn test_add_to_missing_blog_fails() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let author = user("u1");

    let err = ctx
        .for_caller(Some(author.clone()))
        .comments
        .add("ghost", &CommentInput::new("hi"), &author)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(read(&store, "comments/ghost").await, None);
}

#[tokio::test]
async fn test_edit_marks_comment_edited() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let author = user("u1");
    let comments = ctx.for_caller(Some(author.clone())).comments;

    let original = comments
        .add("b1", &CommentInput::new("typo"), &author)
        .await
        .unwrap();
    let edited = comments
        .update("b1", &original.id, &CommentInput::new("fixed"), &author)
        .await
        .unwrap();

    assert_eq!(edited.text, "fixed");
    assert!(edited.is_edited);
    assert_eq!(edited.created_at, original.created_at);
    assert!(edited.updated_at.unwrap() > original.created_at);

    let reread = comments.get("b1", &original.id).await.unwrap().unwrap();
    assert_eq!(reread, edited);

    // A second edit still moves updatedAt forward
    let again = comments
        .update("b1", &original.id, &CommentInput::new("fixed again"), &author)
        .await
        .unwrap();
    assert!(again.updated_at > edited.updated_at);
}

#[tokio::test]
async fn test_only_author_may_edit_or_delete() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let author = user("u1");
    let other = user("u2");

    let comment = ctx
        .for_caller(Some(author.clone()))
        .comments
        .add("b1", &CommentInput::new("mine"), &author)
        .await
        .unwrap();

    let as_other = ctx.for_caller(Some(other.clone())).comments;
    let err = as_other
        .update("b1", &comment.id, &CommentInput::new("yours now"), &other)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PermissionDenied(_)));

    let err = as_other.delete("b1", &comment.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::PermissionDenied(_)));

    assert!(as_other.get("b1", &comment.id).await.unwrap().is_some());
    assert_eq!(read(&store, "blogs/b1/commentsCount").await, Some(json!(1)));

    // Admins may moderate
    let admin = user("mod").with_email("admin@example.com");
    let as_admin = ctx.for_caller(Some(admin)).comments;
    assert!(as_admin.delete("b1", &comment.id).await.unwrap());
}

#[tokio::test]
async fn test_edit_missing_comment_is_not_found() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let author = user("u1");

    let err = ctx
        .for_caller(Some(author.clone()))
        .comments
        .update("b1", "nope", &CommentInput::new("text"), &author)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_decrements_count_once() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let author = user("u1");
    let comments = ctx.for_caller(Some(author.clone())).comments;

    let keep = comments
        .add("b1", &CommentInput::new("keep"), &author)
        .await
        .unwrap();
    let gone = comments
        .add("b1", &CommentInput::new("gone"), &author)
        .await
        .unwrap();
    assert_eq!(read(&store, "blogs/b1/commentsCount").await, Some(json!(2)));

    assert!(comments.delete("b1", &gone.id).await.unwrap());
    assert_eq!(read(&store, "blogs/b1/commentsCount").await, Some(json!(1)));

    // Deleting again is a no-op and leaves the counter alone
    assert!(!comments.delete("b1", &gone.id).await.unwrap());
    assert_eq!(read(&store, "blogs/b1/commentsCount").await, Some(json!(1)));

    let ids: Vec<_> = comments
        .list("b1")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![keep.id]);
}

#[tokio::test]
async fn test_delete_clamps_count_at_zero() {
    let store = seeded_store();
    store
        .write(
            &StorePath::parse("comments/b1/c1").unwrap(),
            json!({"text": "orphan", "userId": "u1", "userName": "User u1",
                   "createdAt": 5, "isEdited": false}),
        )
        .await
        .unwrap();
    let ctx = context(Arc::new(store.clone()));

    assert!(ctx.system().comments.delete("b1", "c1").await.unwrap());
    assert_eq!(read(&store, "blogs/b1/commentsCount").await, Some(json!(0)));
}

#[tokio::test]
async fn test_subscribe_pushes_sorted_lists() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let author = user("u1");
    let comments = ctx.for_caller(Some(author.clone())).comments;

    let seen: Arc<Mutex<Vec<Vec<Comment>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let feed = comments
        .subscribe("b1", move |list| sink.lock().push(list))
        .unwrap();

    for text in ["a", "b", "c"] {
        comments
            .add("b1", &CommentInput::new(text), &author)
            .await
            .unwrap();
    }

    assert!(eventually(|| seen.lock().last().map(|l| l.len()) == Some(3)).await);
    for list in seen.lock().iter() {
        assert!(is_newest_first(list));
    }
    assert_eq!(seen.lock().first().map(|l| l.len()), Some(0));

    comments.unsubscribe(feed);
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let author = user("u1");
    let comments = ctx.for_caller(Some(author.clone())).comments;

    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    let feed = comments
        .subscribe("b1", move |_| *counter.lock() += 1)
        .unwrap();

    comments
        .add("b1", &CommentInput::new("before"), &author)
        .await
        .unwrap();
    assert!(eventually(|| *calls.lock() >= 2).await);

    comments.unsubscribe(feed);
    let after_unsubscribe = *calls.lock();
    assert_eq!(store.listener_count(), 0);

    comments
        .add("b1", &CommentInput::new("after"), &author)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(*calls.lock(), after_unsubscribe);
}
