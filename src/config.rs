//! Custodian configuration
//!
//! Explicit configuration injected at construction. The custodian has no
//! global state: the confidential collection name and the organization of
//! the peer it runs beside both arrive through this struct.

use serde::{Deserialize, Serialize};

use crate::error::{CustodyError, Result};

/// Default name of the confidential record collection.
pub const DEFAULT_COLLECTION: &str = "medCollection";

/// Configuration for a [`Custodian`](crate::Custodian) instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustodianConfig {
    /// Name of the partitioned collection holding confidential records.
    pub collection: String,
    /// Organization id assigned to the local peer by the ledger substrate.
    ///
    /// Writes are only accepted from callers of this organization, so a
    /// client of one org cannot push private data through another org's
    /// peer.
    pub peer_org: String,
}

impl CustodianConfig {
    /// Config for a peer owned by `peer_org`, using the default collection.
    pub fn new(peer_org: impl Into<String>) -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            peer_org: peer_org.into(),
        }
    }

    /// Override the confidential collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.collection.is_empty() {
            return Err(CustodyError::IncompleteInput(
                "collection name must not be empty".into(),
            ));
        }
        if self.peer_org.is_empty() {
            return Err(CustodyError::IncompleteInput(
                "peer organization must not be empty".into(),
            ));
        }
        Ok(())
    }
}
