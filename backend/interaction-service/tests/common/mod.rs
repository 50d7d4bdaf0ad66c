//! Shared fixtures for interaction-service integration tests
//!
//! [`FaultyStore`] wraps a [`MemoryStore`] and can hide the optional atomic
//! primitives, lose every compare-and-swap race, or fail mutations outright.
//! It also counts every mutation that reaches it.
#![allow(dead_code)]

use async_trait::async_trait;
use document_store::{
    DocumentStore, ListenerId, MemoryStore, StoreError, StoreResult, StorePath, StoreSubscription,
};
use interaction_service::domain::Identity;
use interaction_service::security::AccessRules;
use interaction_service::services::{CounterSettings, ServiceContext};
use parking_lot::Mutex;
use resilience::RetryConfig;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How mutations should fail, when they do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Transient,
    PermissionDenied,
}

impl Failure {
    fn error(self) -> StoreError {
        match self {
            Failure::Transient => StoreError::Transient("injected outage".to_string()),
            Failure::PermissionDenied => {
                StoreError::PermissionDenied("injected rejection".to_string())
            }
        }
    }
}

#[derive(Clone)]
pub struct FaultyStore {
    inner: MemoryStore,
    atomic: Arc<AtomicBool>,
    cas: Arc<AtomicBool>,
    always_conflict: Arc<AtomicBool>,
    failure: Arc<Mutex<Option<Failure>>>,
    mutations: Arc<AtomicUsize>,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            atomic: Arc::new(AtomicBool::new(true)),
            cas: Arc::new(AtomicBool::new(true)),
            always_conflict: Arc::new(AtomicBool::new(false)),
            failure: Arc::new(Mutex::new(None)),
            mutations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Report `atomic_increment` as unsupported
    pub fn without_atomic(self) -> Self {
        self.atomic.store(false, Ordering::SeqCst);
        self
    }

    /// Report `compare_and_set` as unsupported
    pub fn without_cas(self) -> Self {
        self.cas.store(false, Ordering::SeqCst);
        self
    }

    /// Make every compare-and-swap lose
    pub fn always_conflict(self) -> Self {
        self.always_conflict.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_mutations(&self, failure: Option<Failure>) {
        *self.failure.lock() = failure;
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn mutate(&self) -> StoreResult<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        match *self.failure.lock() {
            Some(failure) => Err(failure.error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn read(&self, path: &StorePath) -> StoreResult<Option<Value>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        self.mutate()?;
        self.inner.write(path, value).await
    }

    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> StoreResult<()> {
        self.mutate()?;
        self.inner.update(path, fields).await
    }

    async fn remove(&self, path: &StorePath) -> StoreResult<()> {
        self.mutate()?;
        self.inner.remove(path).await
    }

    async fn push(&self, collection: &StorePath) -> StoreResult<String> {
        self.mutate()?;
        self.inner.push(collection).await
    }

    async fn atomic_increment(&self, path: &StorePath, delta: i64) -> StoreResult<i64> {
        if !self.atomic.load(Ordering::SeqCst) {
            return Err(StoreError::Unsupported("atomic_increment"));
        }
        self.mutate()?;
        self.inner.atomic_increment(path, delta).await
    }

    async fn compare_and_set(
        &self,
        path: &StorePath,
        expected: Option<Value>,
        value: Value,
    ) -> StoreResult<bool> {
        if !self.cas.load(Ordering::SeqCst) {
            return Err(StoreError::Unsupported("compare_and_set"));
        }
        self.mutate()?;
        if self.always_conflict.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.compare_and_set(path, expected, value).await
    }

    fn subscribe(&self, path: &StorePath) -> StoreResult<StoreSubscription> {
        self.inner.subscribe(path)
    }

    fn unsubscribe(&self, id: ListenerId) -> StoreResult<()> {
        self.inner.unsubscribe(id)
    }

    fn listener_count(&self) -> usize {
        self.inner.listener_count()
    }
}

/// Store with blog `b1` (zeroed counters) and `b2` (no counters yet)
pub fn seeded_store() -> MemoryStore {
    MemoryStore::from_snapshot(json!({
        "blogs": {
            "b1": {
                "title": "Hello",
                "status": "published",
                "likes": 0,
                "savesCount": 0,
                "commentsCount": 0,
                "views": 0
            },
            "b2": {"title": "Draft", "status": "draft"}
        }
    }))
    .expect("seed snapshot")
}

pub fn settings() -> CounterSettings {
    CounterSettings {
        retry: RetryConfig::contention(5, Duration::from_millis(1)),
        view_timeout: Duration::from_secs(1),
    }
}

pub fn context(store: Arc<dyn DocumentStore>) -> ServiceContext {
    ServiceContext::new(store, AccessRules::new(["admin@example.com"]), settings())
}

pub fn user(id: &str) -> Identity {
    Identity::new(id)
        .with_email(format!("{}@example.com", id))
        .with_name(format!("User {}", id))
}

pub async fn read(store: &dyn DocumentStore, raw: &str) -> Option<Value> {
    store
        .read(&StorePath::parse(raw).expect("valid path"))
        .await
        .expect("read")
}

/// Poll `check` until it holds or a second passes
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
