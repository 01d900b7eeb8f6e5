//! In-memory record store for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use keydesk_core::result::AppResult;
use keydesk_core::traits::RecordStore;
use keydesk_core::types::{ChangeOp, Collection, RecordChange};

/// Volatile record store with the same observable behavior as the HTTP
/// client: keyed JSON documents per collection, shallow-merge patches,
/// and change notifications on every mutation.
pub struct MemoryRecordStore {
    collections: DashMap<Collection, BTreeMap<String, Value>>,
    changes: broadcast::Sender<RecordChange>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            collections: DashMap::new(),
            changes,
        }
    }

    fn notify(&self, collection: Collection, key: &str, op: ChangeOp) {
        let _ = self.changes.send(RecordChange {
            collection,
            key: key.to_string(),
            op,
        });
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list(&self, collection: Collection) -> AppResult<BTreeMap<String, Value>> {
        Ok(self
            .collections
            .get(&collection)
            .map(|c| c.clone())
            .unwrap_or_default())
    }

    async fn get(&self, collection: Collection, key: &str) -> AppResult<Option<Value>> {
        Ok(self
            .collections
            .get(&collection)
            .and_then(|c| c.get(key).cloned()))
    }

    async fn put(&self, collection: Collection, key: &str, value: &Value) -> AppResult<()> {
        self.collections
            .entry(collection)
            .or_default()
            .insert(key.to_string(), value.clone());
        self.notify(collection, key, ChangeOp::Put);
        Ok(())
    }

    async fn insert(&self, collection: Collection, value: &Value) -> AppResult<String> {
        let key = Uuid::new_v4().to_string();
        self.put(collection, &key, value).await?;
        Ok(key)
    }

    async fn patch(&self, collection: Collection, key: &str, fields: &Value) -> AppResult<()> {
        let mut entry = self.collections.entry(collection).or_default();
        let record = entry.entry(key.to_string()).or_insert(Value::Object(
            serde_json::Map::new(),
        ));
        if let (Value::Object(target), Value::Object(updates)) = (record, fields) {
            for (k, v) in updates {
                target.insert(k.clone(), v.clone());
            }
        }
        drop(entry);
        self.notify(collection, key, ChangeOp::Patch);
        Ok(())
    }

    async fn remove(&self, collection: Collection, key: &str) -> AppResult<()> {
        if let Some(mut entry) = self.collections.get_mut(&collection) {
            entry.remove(key);
        }
        self.notify(collection, key, ChangeOp::Remove);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_list_remove() {
        let store = MemoryRecordStore::new();
        store
            .put(Collection::Licenses, "K-1", &json!({"used": false}))
            .await
            .unwrap();

        let all = store.list(Collection::Licenses).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["K-1"]["used"], json!(false));

        store.remove(Collection::Licenses, "K-1").await.unwrap();
        assert!(store.list(Collection::Licenses).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn patch_merges_shallowly() {
        let store = MemoryRecordStore::new();
        store
            .put(Collection::Licenses, "K-1", &json!({"used": false, "hwid": "X"}))
            .await
            .unwrap();
        store
            .patch(Collection::Licenses, "K-1", &json!({"used": true}))
            .await
            .unwrap();

        let record = store.get(Collection::Licenses, "K-1").await.unwrap().unwrap();
        assert_eq!(record["used"], json!(true));
        assert_eq!(record["hwid"], json!("X"));
    }

    #[tokio::test]
    async fn mutations_notify_subscribers() {
        let store = MemoryRecordStore::new();
        let mut changes = store.subscribe();

        store
            .put(Collection::OnlineDevices, "d-1", &json!({}))
            .await
            .unwrap();

        let change = changes.recv().await.unwrap();
        assert_eq!(change.collection, Collection::OnlineDevices);
        assert_eq!(change.key, "d-1");
        assert_eq!(change.op, ChangeOp::Put);
    }

    #[tokio::test]
    async fn insert_generates_distinct_keys() {
        let store = MemoryRecordStore::new();
        let a = store
            .insert(Collection::ActivityLogs, &json!({"n": 1}))
            .await
            .unwrap();
        let b = store
            .insert(Collection::ActivityLogs, &json!({"n": 2}))
            .await
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list(Collection::ActivityLogs).await.unwrap().len(), 2);
    }
}
