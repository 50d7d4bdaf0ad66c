use super::rules::{AccessRules, Change};
use crate::domain::Identity;
use async_trait::async_trait;
use document_store::{
    DocumentStore, ListenerId, StorePath, StoreResult, StoreSubscription,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

/// A [`DocumentStore`] bound to one caller. Every mutation is checked
/// against [`AccessRules`] before it is forwarded; reads and subscriptions
/// pass straight through.
#[derive(Clone)]
pub struct SecuredStore {
    inner: Arc<dyn DocumentStore>,
    rules: Arc<AccessRules>,
    caller: Option<Identity>,
}

impl SecuredStore {
    pub fn new(
        inner: Arc<dyn DocumentStore>,
        rules: Arc<AccessRules>,
        caller: Option<Identity>,
    ) -> Self {
        Self {
            inner,
            rules,
            caller,
        }
    }

    pub fn caller(&self) -> Option<&Identity> {
        self.caller.as_ref()
    }

    fn authorize(&self, path: &StorePath, change: Change<'_>) -> StoreResult<()> {
        self.rules
            .check(self.caller.as_ref(), path, change)
            .map_err(|e| {
                warn!(
                    user_id = self.caller.as_ref().map(|c| c.user_id.as_str()).unwrap_or("anonymous"),
                    path = %path,
                    "Store access denied"
                );
                e
            })
    }
}

/// The node at a path after merging `fields` into `current`
fn merged(current: Option<&Value>, fields: &Map<String, Value>) -> Option<Value> {
    let mut map = current
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    for (key, value) in fields {
        if value.is_null() {
            map.remove(key);
        } else {
            map.insert(key.clone(), value.clone());
        }
    }

    (!map.is_empty()).then_some(Value::Object(map))
}

fn present(value: &Value) -> Option<&Value> {
    (!value.is_null()).then_some(value)
}

#[async_trait]
impl DocumentStore for SecuredStore {
    async fn read(&self, path: &StorePath) -> StoreResult<Option<Value>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        let current = self.inner.read(path).await?;
        self.authorize(
            path,
            Change::Set {
                current: current.as_ref(),
                next: present(&value),
            },
        )?;
        self.inner.write(path, value).await
    }

    async fn update(&self, path: &StorePath, fields: Map<String, Value>) -> StoreResult<()> {
        let current = self.inner.read(path).await?;
        let next = merged(current.as_ref(), &fields);
        self.authorize(
            path,
            Change::Set {
                current: current.as_ref(),
                next: next.as_ref(),
            },
        )?;
        self.inner.update(path, fields).await
    }

    async fn remove(&self, path: &StorePath) -> StoreResult<()> {
        let Some(current) = self.inner.read(path).await? else {
            return Ok(());
        };
        self.authorize(
            path,
            Change::Set {
                current: Some(&current),
                next: None,
            },
        )?;
        self.inner.remove(path).await
    }

    async fn push(&self, collection: &StorePath) -> StoreResult<String> {
        self.authorize(collection, Change::Push)?;
        self.inner.push(collection).await
    }

    async fn atomic_increment(&self, path: &StorePath, delta: i64) -> StoreResult<i64> {
        self.authorize(path, Change::Increment { delta })?;
        self.inner.atomic_increment(path, delta).await
    }

    async fn compare_and_set(
        &self,
        path: &StorePath,
        expected: Option<Value>,
        value: Value,
    ) -> StoreResult<bool> {
        self.authorize(
            path,
            Change::Set {
                current: expected.as_ref(),
                next: present(&value),
            },
        )?;
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

impl std::fmt::Debug for SecuredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecuredStore")
            .field("caller", &self.caller)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_store::{MemoryStore, StoreError};
    use serde_json::json;

    fn p(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    fn secured(store: &MemoryStore, caller: Option<Identity>) -> SecuredStore {
        SecuredStore::new(
            Arc::new(store.clone()),
            Arc::new(AccessRules::default()),
            caller,
        )
    }

    #[tokio::test]
    async fn test_denied_mutation_never_reaches_store() {
        let store = MemoryStore::new();
        let u2 = secured(&store, Some(Identity::new("u2")));

        let err = u2
            .write(&p("likes/b1/u1"), json!({"userId": "u1", "createdAt": 1}))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::PermissionDenied(_)));
        assert_eq!(store.read(&p("likes/b1/u1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_is_checked_against_merged_record() {
        let store = MemoryStore::new();
        store
            .write(
                &p("comments/b1/c1"),
                json!({"text": "hi", "userId": "u1", "createdAt": 5}),
            )
            .await
            .unwrap();

        let author = secured(&store, Some(Identity::new("u1")));
        let mut edit = Map::new();
        edit.insert("text".into(), json!("edited"));
        author.update(&p("comments/b1/c1"), edit).await.unwrap();

        let mut hijack = Map::new();
        hijack.insert("userId".into(), json!("u2"));
        assert!(author.update(&p("comments/b1/c1"), hijack).await.is_err());

        assert_eq!(
            store.read(&p("comments/b1/c1/text")).await.unwrap(),
            Some(json!("edited"))
        );
    }

    #[tokio::test]
    async fn test_removing_absent_node_is_noop() {
        let store = MemoryStore::new();
        let anon = secured(&store, None);
        anon.remove(&p("blogs/b1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_reads_pass_through() {
        let store = MemoryStore::new();
        store.write(&p("blogs/b1/likes"), json!(3)).await.unwrap();

        let anon = secured(&store, None);
        assert_eq!(anon.read(&p("blogs/b1/likes")).await.unwrap(), Some(json!(3)));
    }
}
