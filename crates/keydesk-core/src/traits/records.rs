//! Remote record store trait.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::broadcast;

use crate::result::AppResult;
use crate::types::change::RecordChange;
use crate::types::collection::Collection;

/// A networked document store addressed by collection and record key.
///
/// Records are schemaless JSON objects; the entity crate defines the typed
/// forms. Mutations publish a [`RecordChange`] so that listeners can
/// refetch, which is how device-presence updates propagate to the console.
///
/// Errors are mapped into `AppError` at this boundary; callers never see
/// raw transport failures. No operation is retried.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// List every record in a collection as a key → document map.
    async fn list(&self, collection: Collection) -> AppResult<BTreeMap<String, Value>>;

    /// Fetch one record. Returns `None` if the key is absent.
    async fn get(&self, collection: Collection, key: &str) -> AppResult<Option<Value>>;

    /// Create or replace the record at an explicit key.
    ///
    /// There is no collision check: writing an existing key overwrites it.
    async fn put(&self, collection: Collection, key: &str, value: &Value) -> AppResult<()>;

    /// Insert a record under a store-generated key and return that key.
    async fn insert(&self, collection: Collection, value: &Value) -> AppResult<String>;

    /// Merge the given fields into an existing record.
    async fn patch(&self, collection: Collection, key: &str, fields: &Value) -> AppResult<()>;

    /// Delete a record. Deleting an absent key is a no-op.
    async fn remove(&self, collection: Collection, key: &str) -> AppResult<()>;

    /// Subscribe to change notifications published by this store.
    fn subscribe(&self) -> broadcast::Receiver<RecordChange>;
}
