//! Reader-side session: guards, optimistic updates and live comments

mod common;

use common::{context, eventually, read, seeded_store, user, Failure, FaultyStore};
use document_store::DocumentStore;
use interaction_service::client::{InteractionError, PostSession, SessionIdentity};
use interaction_service::services::CommentInput;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_anonymous_reader_cannot_mutate() {
    let store = FaultyStore::new(seeded_store());
    let ctx = context(Arc::new(store.clone()));
    let session = PostSession::open(ctx, Arc::new(SessionIdentity::anonymous()), "b1")
        .await
        .unwrap();

    // Let the view count land before measuring
    assert!(eventually(|| store.mutations() >= 1).await);
    let before = store.mutations();

    assert!(matches!(
        session.toggle_like().await,
        Err(InteractionError::AuthRequired { .. })
    ));
    assert!(matches!(
        session.toggle_save().await,
        Err(InteractionError::AuthRequired { .. })
    ));
    let err = session.add_comment("hello").await.unwrap_err();
    assert_eq!(err.user_message(), "Please sign in to comment.");

    assert_eq!(store.mutations(), before);
    assert_eq!(read(&store, "likes/b1").await, None);
    assert_eq!(read(&store, "comments/b1").await, None);
    assert_eq!(session.state().likes_count, 0);
    assert!(session.state().comments.is_empty());
}

#[tokio::test]
async fn test_open_loads_state_and_counts_view() {
    let store = seeded_store();
    store
        .write(
            &document_store::StorePath::parse("likes/b1/u1").unwrap(),
            json!({"userId": "u1", "createdAt": 1}),
        )
        .await
        .unwrap();
    store
        .write(
            &document_store::StorePath::parse("blogs/b1/likes").unwrap(),
            json!(1),
        )
        .await
        .unwrap();
    let ctx = context(Arc::new(store.clone()));

    let session = PostSession::open(ctx, Arc::new(SessionIdentity::signed_in(user("u1"))), "b1")
        .await
        .unwrap();

    let state = session.state();
    assert!(state.liked);
    assert!(!state.saved);
    assert_eq!(state.likes_count, 1);
    assert!(session.is_live());

    let mut views = None;
    for _ in 0..100 {
        views = read(&store, "blogs/b1/views").await;
        if views == Some(json!(1)) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(views, Some(json!(1)));
}

#[tokio::test]
async fn test_open_missing_blog_fails() {
    let ctx = context(Arc::new(seeded_store()));
    let result = PostSession::open(ctx, Arc::new(SessionIdentity::anonymous()), "ghost").await;
    assert!(matches!(result, Err(InteractionError::NotFound)));
}

#[tokio::test]
async fn test_toggle_like_updates_local_state() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let session = PostSession::open(ctx, Arc::new(SessionIdentity::signed_in(user("u1"))), "b1")
        .await
        .unwrap();

    assert!(session.toggle_like().await.unwrap());
    let state = session.state();
    assert!(state.liked);
    assert_eq!(state.likes_count, 1);

    assert!(!session.toggle_like().await.unwrap());
    let state = session.state();
    assert!(!state.liked);
    assert_eq!(state.likes_count, 0);
    assert_eq!(read(&store, "blogs/b1/likes").await, Some(json!(0)));
}

#[tokio::test]
async fn test_failed_toggle_reverts_optimistic_update() {
    let store = FaultyStore::new(seeded_store());
    let ctx = context(Arc::new(store.clone()));
    let session = PostSession::open(ctx, Arc::new(SessionIdentity::signed_in(user("u1"))), "b1")
        .await
        .unwrap();
    // Wait out the view increment so the failure only hits the toggle
    assert!(eventually(|| store.mutations() >= 1).await);

    store.fail_mutations(Some(Failure::Transient));
    assert_eq!(
        session.toggle_save().await.unwrap_err(),
        InteractionError::Retryable
    );
    let state = session.state();
    assert!(!state.saved);
    assert_eq!(state.saves_count, 0);

    store.fail_mutations(Some(Failure::PermissionDenied));
    assert_eq!(
        session.toggle_like().await.unwrap_err(),
        InteractionError::Reauthenticate
    );
    assert!(!session.state().liked);
    assert_eq!(session.state().likes_count, 0);
}

#[tokio::test]
async fn test_failed_comment_removes_pending_entry() {
    let store = FaultyStore::new(seeded_store());
    let ctx = context(Arc::new(store.clone()));
    let session = PostSession::open(ctx, Arc::new(SessionIdentity::signed_in(user("u1"))), "b1")
        .await
        .unwrap();

    store.fail_mutations(Some(Failure::Transient));
    assert!(session.add_comment("lost").await.is_err());
    assert!(session.state().comments.is_empty());

    assert!(matches!(
        session.add_comment("   ").await,
        Err(InteractionError::Rejected(_))
    ));
}

#[tokio::test]
async fn test_comments_flow_and_live_updates() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let session = PostSession::open(
        ctx.clone(),
        Arc::new(SessionIdentity::signed_in(user("u1"))),
        "b1",
    )
    .await
    .unwrap();

    let mine = session.add_comment("mine").await.unwrap();
    assert!(eventually(|| {
        let state = session.state();
        state.comments.len() == 1 && state.comments[0].id == mine.id
    })
    .await);

    // Another reader comments; the feed replaces the local list
    let other = user("u2");
    ctx.for_caller(Some(other.clone()))
        .comments
        .add("b1", &CommentInput::new("theirs"), &other)
        .await
        .unwrap();
    assert!(eventually(|| session.state().comments.len() == 2).await);
    assert_eq!(session.state().comments[0].text, "theirs");

    let edited = session.edit_comment(&mine.id, "mine, edited").await.unwrap();
    assert!(edited.is_edited);
    assert!(eventually(|| {
        session
            .state()
            .comments
            .iter()
            .any(|c| c.id == mine.id && c.text == "mine, edited")
    })
    .await);

    assert!(session.delete_comment(&mine.id).await.unwrap());
    assert!(eventually(|| session.state().comments.len() == 1).await);
    assert_eq!(read(&store, "blogs/b1/commentsCount").await, Some(json!(1)));
}

#[tokio::test]
async fn test_editing_someone_elses_comment_reverts() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let other = user("u2");
    let theirs = ctx
        .for_caller(Some(other.clone()))
        .comments
        .add("b1", &CommentInput::new("theirs"), &other)
        .await
        .unwrap();

    let session = PostSession::open(ctx, Arc::new(SessionIdentity::signed_in(user("u1"))), "b1")
        .await
        .unwrap();

    assert_eq!(
        session.edit_comment(&theirs.id, "hijacked").await.unwrap_err(),
        InteractionError::Reauthenticate
    );
    assert_eq!(session.state().comments[0].text, "theirs");
    assert!(!session.state().comments[0].is_edited);
}

#[tokio::test]
async fn test_sign_out_mid_session_and_close() {
    let store = seeded_store();
    let ctx = context(Arc::new(store.clone()));
    let identity = Arc::new(SessionIdentity::signed_in(user("u1")));
    let session = PostSession::open(ctx.clone(), identity.clone(), "b1")
        .await
        .unwrap();

    identity.sign_out();
    assert!(matches!(
        session.toggle_like().await,
        Err(InteractionError::AuthRequired { .. })
    ));

    session.close();
    assert!(!session.is_live());
    session.close();

    let other = user("u2");
    ctx.for_caller(Some(other.clone()))
        .comments
        .add("b1", &CommentInput::new("unseen"), &other)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(session.state().comments.is_empty());
}
