//! Live subscriptions
//!
//! A [`LiveFeed`] registers a store listener on a subtree and drives a
//! callback from a background task: every snapshot is materialized into a
//! fresh value (for comments, the whole re-sorted list) and handed over in
//! store emission order.
//!
//! Once [`LiveFeed::unsubscribe`] returns, the callback is never invoked
//! again. Dropping the handle detaches it the same way.

use crate::error::ServiceResult;
use document_store::{DocumentStore, ListenerId, StorePath};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct LiveFeed {
    id: ListenerId,
    path: StorePath,
    store: Arc<dyn DocumentStore>,
    active: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl LiveFeed {
    /// Subscribe to `path`. Must be called within a tokio runtime.
    pub fn spawn<T, M, C>(
        store: Arc<dyn DocumentStore>,
        path: StorePath,
        materialize: M,
        mut callback: C,
    ) -> ServiceResult<Self>
    where
        T: Send + 'static,
        M: Fn(Option<Value>) -> T + Send + 'static,
        C: FnMut(T) + Send + 'static,
    {
        let mut subscription = store.subscribe(&path)?;
        let active = Arc::new(Mutex::new(true));
        let gate = active.clone();
        let id = subscription.id;

        let task = tokio::spawn(async move {
            while let Some(snapshot) = subscription.receiver.recv().await {
                let value = materialize(snapshot.value);

                // Held across the callback so unsubscribe waits for an
                // in-flight delivery to finish.
                let open = gate.lock();
                if !*open {
                    break;
                }
                callback(value);
            }
            debug!(listener = %id, "Live feed task finished");
        });

        debug!(listener = %id, path = %path, "Live feed started");

        Ok(Self {
            id,
            path,
            store,
            active,
            task: Some(task),
        })
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        *self.active.lock()
    }

    /// Detach the listener. No callback runs after this returns.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        {
            let mut open = self.active.lock();
            if !*open {
                return;
            }
            *open = false;
        }

        if let Err(e) = self.store.unsubscribe(self.id) {
            warn!(listener = %self.id, error = %e, "Failed to detach store listener");
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!(listener = %self.id, path = %self.path, "Live feed stopped");
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for LiveFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFeed")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("active", &self.is_active())
            .finish()
    }
}
