//! Per-post interaction state for a reader
//!
//! A [`PostSession`] is opened when a blog detail view loads. It seeds
//! `{liked, saved, likesCount, savesCount, comments}` from one fetch, counts
//! the view, and keeps `comments` live through a subscription. Mutations are
//! applied to local state immediately and reverted if the service call
//! fails; comment pushes from the subscription always replace the local list
//! wholesale.

use super::error::InteractionError;
use super::identity::IdentityProvider;
use crate::domain::{Comment, Identity, RelationKind};
use crate::repository::comments::sort_newest_first;
use crate::services::{CommentInput, Interactions, LiveFeed, ServiceContext};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

const PENDING_PREFIX: &str = "pending-";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionState {
    pub liked: bool,
    pub saved: bool,
    pub likes_count: i64,
    pub saves_count: i64,
    pub comments: Vec<Comment>,
}

impl InteractionState {
    fn relation(&mut self, kind: RelationKind) -> (&mut bool, &mut i64) {
        match kind {
            RelationKind::Like => (&mut self.liked, &mut self.likes_count),
            RelationKind::Save => (&mut self.saved, &mut self.saves_count),
        }
    }
}

pub struct PostSession {
    blog_id: String,
    context: ServiceContext,
    identity: Arc<dyn IdentityProvider>,
    state: Arc<Mutex<InteractionState>>,
    feed: Mutex<Option<LiveFeed>>,
}

impl PostSession {
    /// Load the post's interaction state and start the comment feed.
    pub async fn open(
        context: ServiceContext,
        identity: Arc<dyn IdentityProvider>,
        blog_id: impl Into<String>,
    ) -> Result<Self, InteractionError> {
        let blog_id = blog_id.into();
        let services = context.for_caller(identity.current());

        let state = Arc::new(Mutex::new(InteractionState::default()));
        let session = Self {
            blog_id,
            context,
            identity,
            state,
            feed: Mutex::new(None),
        };
        session.load(&services).await?;

        let state = session.state.clone();
        let feed = services
            .comments
            .subscribe(&session.blog_id, move |comments| {
                state.lock().comments = comments;
            })
            .map_err(InteractionError::from)?;
        *session.feed.lock() = Some(feed);

        // Best effort; never delays the view
        services.views.spawn_increment(session.blog_id.clone());

        debug!(blog_id = %session.blog_id, "Post session opened");
        Ok(session)
    }

    async fn load(&self, services: &Interactions) -> Result<(), InteractionError> {
        let counters = services.stats.get(&self.blog_id).await?;
        let comments = services.comments.list(&self.blog_id).await?;

        let (liked, saved) = match self.identity.current() {
            Some(identity) => (
                services
                    .likes
                    .has_relation(&self.blog_id, &identity.user_id)
                    .await?,
                services
                    .saves
                    .has_relation(&self.blog_id, &identity.user_id)
                    .await?,
            ),
            None => (false, false),
        };

        let mut state = self.state.lock();
        state.liked = liked;
        state.saved = saved;
        state.likes_count = counters.likes;
        state.saves_count = counters.saves_count;
        state.comments = comments;
        Ok(())
    }

    pub fn blog_id(&self) -> &str {
        &self.blog_id
    }

    /// Snapshot of the current local state
    pub fn state(&self) -> InteractionState {
        self.state.lock().clone()
    }

    /// Whether the comment feed is attached
    pub fn is_live(&self) -> bool {
        self.feed.lock().is_some()
    }

    /// Re-fetch counters and relation flags (comments are already live).
    pub async fn refresh(&self) -> Result<(), InteractionError> {
        let services = self.context.for_caller(self.identity.current());
        self.load(&services).await
    }

    fn require_identity(&self, action: &'static str) -> Result<Identity, InteractionError> {
        self.identity
            .current()
            .ok_or(InteractionError::AuthRequired { action })
    }

    pub async fn toggle_like(&self) -> Result<bool, InteractionError> {
        self.toggle(RelationKind::Like, "like this post").await
    }

    pub async fn toggle_save(&self) -> Result<bool, InteractionError> {
        self.toggle(RelationKind::Save, "save this post").await
    }

    async fn toggle(&self, kind: RelationKind, action: &'static str) -> Result<bool, InteractionError> {
        let identity = self.require_identity(action)?;

        let previous = {
            let mut state = self.state.lock();
            let (active, count) = state.relation(kind);
            let previous = (*active, *count);
            *active = !previous.0;
            *count = if previous.0 {
                (previous.1 - 1).max(0)
            } else {
                previous.1 + 1
            };
            previous
        };

        let services = self.context.for_caller(Some(identity.clone()));
        let result = services
            .relation(kind)
            .toggle(&self.blog_id, &identity)
            .await;

        let mut state = self.state.lock();
        let (active, count) = state.relation(kind);
        match result {
            Ok(outcome) => {
                *active = outcome.active;
                if let Some(value) = outcome.count {
                    *count = value;
                }
                Ok(outcome.active)
            }
            Err(e) => {
                warn!(blog_id = %self.blog_id, kind = %kind, error = %e, "Toggle failed, reverting");
                *active = previous.0;
                *count = previous.1;
                Err(e.into())
            }
        }
    }

    pub async fn add_comment(&self, text: &str) -> Result<Comment, InteractionError> {
        let identity = self.require_identity("comment")?;
        let input = CommentInput::new(text);
        let normalized = input.normalized().map_err(InteractionError::from)?;

        let pending_id = format!("{}{}", PENDING_PREFIX, Uuid::new_v4().simple());
        {
            let mut state = self.state.lock();
            state.comments.insert(
                0,
                Comment {
                    id: pending_id.clone(),
                    text: normalized,
                    user_id: identity.user_id.clone(),
                    user_name: identity.display_name().to_string(),
                    user_email: identity.email.clone(),
                    user_photo: identity.photo.clone(),
                    created_at: i64::MAX,
                    updated_at: None,
                    is_edited: false,
                },
            );
        }

        let services = self.context.for_caller(Some(identity.clone()));
        let result = services.comments.add(&self.blog_id, &input, &identity).await;

        let mut state = self.state.lock();
        state.comments.retain(|c| c.id != pending_id);
        match result {
            Ok(comment) => {
                if !state.comments.iter().any(|c| c.id == comment.id) {
                    state.comments.push(comment.clone());
                    sort_newest_first(&mut state.comments);
                }
                Ok(comment)
            }
            Err(e) => {
                warn!(blog_id = %self.blog_id, error = %e, "Comment not posted");
                Err(e.into())
            }
        }
    }

    pub async fn edit_comment(&self, comment_id: &str, text: &str) -> Result<Comment, InteractionError> {
        let identity = self.require_identity("edit comments")?;
        let input = CommentInput::new(text);
        let normalized = input.normalized().map_err(InteractionError::from)?;

        let previous = {
            let mut state = self.state.lock();
            state
                .comments
                .iter_mut()
                .find(|c| c.id == comment_id)
                .map(|c| {
                    let previous = c.clone();
                    c.text = normalized;
                    c.is_edited = true;
                    previous
                })
        };

        let services = self.context.for_caller(Some(identity.clone()));
        let result = services
            .comments
            .update(&self.blog_id, comment_id, &input, &identity)
            .await;

        let mut state = self.state.lock();
        let slot = state.comments.iter_mut().find(|c| c.id == comment_id);
        match result {
            Ok(comment) => {
                if let Some(slot) = slot {
                    *slot = comment.clone();
                }
                Ok(comment)
            }
            Err(e) => {
                warn!(blog_id = %self.blog_id, comment_id, error = %e, "Comment edit failed, reverting");
                if let (Some(slot), Some(previous)) = (slot, previous) {
                    *slot = previous;
                }
                Err(e.into())
            }
        }
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<bool, InteractionError> {
        let identity = self.require_identity("delete comments")?;

        let removed = {
            let mut state = self.state.lock();
            let index = state.comments.iter().position(|c| c.id == comment_id);
            index.map(|i| state.comments.remove(i))
        };

        let services = self.context.for_caller(Some(identity));
        match services.comments.delete(&self.blog_id, comment_id).await {
            Ok(deleted) => Ok(deleted),
            Err(e) => {
                warn!(blog_id = %self.blog_id, comment_id, error = %e, "Comment delete failed, reverting");
                if let Some(comment) = removed {
                    let mut state = self.state.lock();
                    if !state.comments.iter().any(|c| c.id == comment.id) {
                        state.comments.push(comment);
                        sort_newest_first(&mut state.comments);
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Detach the comment feed. Safe to call more than once.
    pub fn close(&self) {
        let feed = self.feed.lock().take();
        if let Some(feed) = feed {
            feed.unsubscribe();
            debug!(blog_id = %self.blog_id, "Post session closed");
        }
    }
}

impl Drop for PostSession {
    fn drop(&mut self) {
        self.close();
    }
}
