//! Hierarchical real-time document store
//!
//! The store is a tree of JSON values addressed by `/`-separated paths
//! (`{collection}/{id}/{field}`). Besides point reads and writes it offers
//! optional atomic primitives and subtree subscriptions.
//!
//! # Subscriptions
//!
//! ```text
//! subscribe("comments/b1")
//!   ├─ current snapshot delivered immediately
//!   ├─ write("comments/b1/c7", ..)  → snapshot of comments/b1
//!   ├─ update("blogs/b1", ..)       → (not delivered, disjoint path)
//!   └─ unsubscribe(id)              → sender dropped, receiver yields None
//! ```
//!
//! # Example
//!
//! ```no_run
//! use document_store::{DocumentStore, MemoryStore, StorePath};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), document_store::StoreError> {
//!     let store = MemoryStore::new();
//!     let views = StorePath::parse("blogs/b1/views")?;
//!
//!     store.write(&views, json!(0)).await?;
//!     store.atomic_increment(&views, 1).await?;
//!
//!     let mut sub = store.subscribe(&StorePath::parse("blogs/b1")?)?;
//!     let snapshot = sub.receiver.recv().await;
//!     println!("{:?}", snapshot);
//!
//!     store.unsubscribe(sub.id)?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use tokio::sync::mpsc;

mod error;
mod memory;
mod path;
mod tree;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use path::StorePath;

/// Identifier of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Value of a watched subtree at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: StorePath,
    pub value: Option<Value>,
}

impl Snapshot {
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }
}

/// A live registration returned by [`DocumentStore::subscribe`]
#[derive(Debug)]
pub struct StoreSubscription {
    pub id: ListenerId,
    pub receiver: mpsc::UnboundedReceiver<Snapshot>,
}

/// Interface every backing store implements.
///
/// `atomic_increment` and `compare_and_set` are optional capabilities; the
/// default implementations report [`StoreError::Unsupported`] so callers can
/// fall back to weaker strategies.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the subtree at `path`; `None` when nothing is stored there.
    async fn read(&self, path: &StorePath) -> StoreResult<Option<Value>>;

    /// Replace the subtree at `path`. Writing `null` removes it.
    async fn write(&self, path: &StorePath, value: Value) -> StoreResult<()>;

    /// Merge the named children into the node at `path`.
    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> StoreResult<()>;

    async fn remove(&self, path: &StorePath) -> StoreResult<()>;

    /// Generate a fresh, unique child key under `collection`. Nothing is
    /// written until the caller writes to the returned key.
    async fn push(&self, collection: &StorePath) -> StoreResult<String>;

    /// Add `delta` to the integer at `path` (absent counts as 0) and return
    /// the new value.
    async fn atomic_increment(&self, _path: &StorePath, _delta: i64) -> StoreResult<i64> {
        Err(StoreError::Unsupported("atomic_increment"))
    }

    /// Replace the value at `path` with `value` only if it currently equals
    /// `expected` (`None` meaning absent). Returns whether the swap happened.
    async fn compare_and_set(
        &self,
        _path: &StorePath,
        _expected: Option<Value>,
        _value: Value,
    ) -> StoreResult<bool> {
        Err(StoreError::Unsupported("compare_and_set"))
    }

    /// Register a listener on the subtree at `path`.
    fn subscribe(&self, path: &StorePath) -> StoreResult<StoreSubscription>;

    /// Detach a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: ListenerId) -> StoreResult<()>;

    /// Number of currently registered listeners
    fn listener_count(&self) -> usize;
}
