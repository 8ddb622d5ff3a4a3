//! Record store seam
//!
//! The entire ledger substrate sits behind [`RecordStore`]: a replicated,
//! ordered key space for confidential collections plus a public append-only
//! space for the audit trail. The core trusts it for durability, ordering,
//! and per-invocation atomic commit-or-abort; nothing here retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub mod memory;

pub use memory::MemoryStore;

/// One key/value row from a range or rich query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// Structured equality selector for rich queries.
///
/// Matches records whose named top-level field equals the given string
/// value. Rich queries are point-in-time and non-transactional: the result
/// set may shift under concurrent writers, so they must never feed a write
/// decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub field: String,
    pub value: String,
}

impl Selector {
    pub fn field_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Ledger substrate interface.
///
/// Confidential data lives in named partitioned collections; the audit
/// trail and other public state live in a shared public space written with
/// [`put_public`](RecordStore::put_public). History is retained per key
/// until purged.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Current value of a confidential key, if present.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write a confidential value.
    async fn put(&self, collection: &str, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Remove the live confidential value. Durable history remains.
    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;

    /// Remove the live confidential value and its durable history.
    async fn purge(&self, collection: &str, key: &str) -> Result<(), StoreError>;

    /// All confidential entries with `start <= key < end` in lexical order.
    /// An empty bound means unbounded on that side. The result is finite and
    /// materialized; it is not restartable.
    async fn range_query(
        &self,
        collection: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<KeyValue>, StoreError>;

    /// Confidential entries matching a structured selector.
    async fn rich_query(
        &self,
        collection: &str,
        selector: &Selector,
    ) -> Result<Vec<KeyValue>, StoreError>;

    /// Append a value for a public key (audit entries, key registry).
    /// Every write is retained in the key's history.
    async fn put_public(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Full history of a public key, oldest to newest. Empty when the key
    /// has never been written.
    async fn history_of(&self, key: &str) -> Result<Vec<String>, StoreError>;
}
