//! Embedded in-process store
//!
//! All state lives behind one `RwLock`. Listener notifications are sent while
//! the write lock is held, so every listener observes snapshots in the same
//! order the mutations were applied.

use crate::error::{StoreError, StoreResult};
use crate::path::StorePath;
use crate::tree;
use crate::{DocumentStore, ListenerId, Snapshot, StoreSubscription};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

struct Listener {
    path: StorePath,
    tx: mpsc::UnboundedSender<Snapshot>,
}

struct Inner {
    root: Value,
    listeners: HashMap<ListenerId, Listener>,
    next_listener: u64,
}

impl Inner {
    /// Apply `f` to the tree and notify listeners overlapping `changed` if
    /// the subtree at `changed` actually changed.
    fn mutate<R>(&mut self, changed: &StorePath, f: impl FnOnce(&mut Value) -> R) -> R {
        let before = tree::get(&self.root, changed).cloned();
        let result = f(&mut self.root);
        let after = tree::get(&self.root, changed);

        if before.as_ref() != after {
            self.notify(changed);
        }
        result
    }

    fn notify(&mut self, changed: &StorePath) {
        let mut dead = Vec::new();

        for (id, listener) in &self.listeners {
            if !listener.path.overlaps(changed) {
                continue;
            }
            let snapshot = Snapshot {
                path: listener.path.clone(),
                value: tree::get(&self.root, &listener.path).cloned(),
            };
            if listener.tx.send(snapshot).is_err() {
                dead.push(*id);
            }
        }

        for id in dead {
            trace!(listener = %id, "Pruning listener with dropped receiver");
            self.listeners.remove(&id);
        }
    }
}

/// In-memory [`DocumentStore`] with every optional capability.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                root: Value::Object(Map::new()),
                listeners: HashMap::new(),
                next_listener: 0,
            })),
        }
    }

    /// Create a store pre-populated from a JSON export. The export must be an
    /// object at the top level.
    pub fn from_snapshot(data: Value) -> StoreResult<Self> {
        let Value::Object(map) = data else {
            return Err(StoreError::InvalidValue {
                path: "/".to_string(),
                reason: "snapshot root must be an object".to_string(),
            });
        };

        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for (key, value) in map {
                let path = StorePath::parse(&key)?;
                tree::set(&mut inner.root, &path, value);
            }
        }
        Ok(store)
    }

    /// Full copy of the tree.
    pub fn export(&self) -> Value {
        self.inner.read().root.clone()
    }
}

fn as_counter(path: &StorePath, value: Option<&Value>) -> StoreResult<i64> {
    match value {
        None => Ok(0),
        Some(v) => v.as_i64().ok_or_else(|| StoreError::InvalidValue {
            path: path.to_string(),
            reason: format!("expected integer, found {}", v),
        }),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &StorePath) -> StoreResult<Option<Value>> {
        Ok(tree::get(&self.inner.read().root, path).cloned())
    }

    async fn write(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.mutate(path, |root| tree::set(root, path, value));
        Ok(())
    }

    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> StoreResult<()> {
        let children = fields
            .into_iter()
            .map(|(key, value)| Ok((path.child(&key)?, value)))
            .collect::<StoreResult<Vec<_>>>()?;

        let mut inner = self.inner.write();
        inner.mutate(path, |root| {
            for (child, value) in children {
                tree::set(root, &child, value);
            }
        });
        Ok(())
    }

    async fn remove(&self, path: &StorePath) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.mutate(path, |root| tree::remove(root, path));
        Ok(())
    }

    async fn push(&self, collection: &StorePath) -> StoreResult<String> {
        let key = Uuid::new_v4().simple().to_string();
        debug!(collection = %collection, key = %key, "Generated child key");
        Ok(key)
    }

    async fn atomic_increment(&self, path: &StorePath, delta: i64) -> StoreResult<i64> {
        let mut inner = self.inner.write();
        let current = as_counter(path, tree::get(&inner.root, path))?;
        let next = current.saturating_add(delta);
        inner.mutate(path, |root| tree::set(root, path, Value::from(next)));
        Ok(next)
    }

    async fn compare_and_set(
        &self,
        path: &StorePath,
        expected: Option<Value>,
        value: Value,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.write();
        if tree::get(&inner.root, path) != expected.as_ref() {
            return Ok(false);
        }
        inner.mutate(path, |root| tree::set(root, path, value));
        Ok(true)
    }

    fn subscribe(&self, path: &StorePath) -> StoreResult<StoreSubscription> {
        let (tx, receiver) = mpsc::unbounded_channel();
        let mut inner = self.inner.write();

        inner.next_listener += 1;
        let id = ListenerId(inner.next_listener);

        // Initial snapshot; the receiver is still held so this cannot fail.
        let _ = tx.send(Snapshot {
            path: path.clone(),
            value: tree::get(&inner.root, path).cloned(),
        });

        inner.listeners.insert(
            id,
            Listener {
                path: path.clone(),
                tx,
            },
        );
        debug!(listener = %id, path = %path, "Listener registered");

        Ok(StoreSubscription { id, receiver })
    }

    fn unsubscribe(&self, id: ListenerId) -> StoreResult<()> {
        if self.inner.write().listeners.remove(&id).is_some() {
            debug!(listener = %id, "Listener detached");
        }
        Ok(())
    }

    fn listener_count(&self) -> usize {
        self.inner.read().listeners.len()
    }
}
