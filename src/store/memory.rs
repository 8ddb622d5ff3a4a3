//! In-memory record store
//!
//! Reference backend for tests and embedding. Keeps the same observable
//! semantics the core expects from the real substrate: lexical key order,
//! per-key history on every write, delete keeps history, purge drops it.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StoreError;

use super::{KeyValue, RecordStore, Selector};

#[derive(Default)]
struct Collection {
    /// Live values in lexical key order.
    live: BTreeMap<String, Vec<u8>>,
    /// Every committed value per key, oldest first.
    history: HashMap<String, Vec<Vec<u8>>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Collection>,
    /// Public space: full value history per key, oldest first.
    public: HashMap<String, Vec<String>>,
}

/// In-memory [`RecordStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn range_bounds(start: &str, end: &str) -> (Bound<String>, Bound<String>) {
    let lower = if start.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Included(start.to_string())
    };
    let upper = if end.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(end.to_string())
    };
    (lower, upper)
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|c| c.live.get(key))
            .cloned())
    }

    async fn put(&self, collection: &str, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let coll = inner.collections.entry(collection.to_string()).or_default();
        coll.live.insert(key.to_string(), value.to_vec());
        coll.history
            .entry(key.to_string())
            .or_default()
            .push(value.to_vec());
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(coll) = inner.collections.get_mut(collection) {
            coll.live.remove(key);
        }
        Ok(())
    }

    async fn purge(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(coll) = inner.collections.get_mut(collection) {
            coll.live.remove(key);
            coll.history.remove(key);
        }
        Ok(())
    }

    async fn range_query(
        &self,
        collection: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<KeyValue>, StoreError> {
        let inner = self.inner.read().await;
        let Some(coll) = inner.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(coll
            .live
            .range(range_bounds(start, end))
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn rich_query(
        &self,
        collection: &str,
        selector: &Selector,
    ) -> Result<Vec<KeyValue>, StoreError> {
        let inner = self.inner.read().await;
        let Some(coll) = inner.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(coll
            .live
            .iter()
            .filter(|(_, value)| {
                serde_json::from_slice::<serde_json::Value>(value)
                    .ok()
                    .and_then(|doc| doc.get(&selector.field).cloned())
                    .and_then(|field| field.as_str().map(|s| s == selector.value))
                    .unwrap_or(false)
            })
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn put_public(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .public
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    async fn history_of(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.public.get(key).cloned().unwrap_or_default())
    }
}
