//! Record custodian
//!
//! The decision core between callers and the ledger substrate. Every
//! operation receives the verified caller identity, resolves current record
//! state through the store seam, evaluates the authorization rules, applies
//! the mutation, and records the audit entry - in that order, so a denial at
//! any stage leaves no trace and no state change behind it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::asset::Asset;
use crate::audit::{audit_key, AclChange, AuditEntry, AuditKind};
use crate::config::CustodianConfig;
use crate::error::{CustodyError, Result};
use crate::identity::CallerIdentity;
use crate::policy;
use crate::query;
use crate::store::{RecordStore, Selector};

/// Confidential payload for record creation. Delivered out-of-band by the
/// substrate; never placed on the public log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssetInput {
    #[serde(rename = "assetID")]
    pub asset_id: String,
    pub pointer: String,
    #[serde(rename = "dataSubject")]
    pub data_subject: String,
    pub version: u32,
    pub filekey: String,
    pub acl: Vec<String>,
}

impl CreateAssetInput {
    fn validate(&self) -> Result<()> {
        let missing = if self.asset_id.is_empty() {
            Some("assetID")
        } else if self.pointer.is_empty() {
            Some("pointer")
        } else if self.data_subject.is_empty() {
            Some("dataSubject")
        } else if self.filekey.is_empty() {
            Some("filekey")
        } else if self.acl.is_empty() {
            Some("acl")
        } else {
            None
        };
        if let Some(field) = missing {
            return Err(CustodyError::IncompleteInput(format!(
                "empty input: {field}"
            )));
        }
        if self.version < 1 {
            return Err(CustodyError::IncompleteInput(
                "wrong input: version must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Opaque key material registered for the caller's organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadKeyInput {
    pub key: String,
    #[serde(rename = "keyType")]
    pub key_type: String,
}

impl UploadKeyInput {
    fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(CustodyError::IncompleteInput("empty input: key".into()));
        }
        if self.key_type.is_empty() {
            return Err(CustodyError::IncompleteInput("empty input: keyType".into()));
        }
        Ok(())
    }
}

/// The custody core, generic over the ledger substrate.
pub struct Custodian<S: RecordStore> {
    config: CustodianConfig,
    store: Arc<S>,
}

impl<S: RecordStore> Custodian<S> {
    /// Build a custodian over a store with a validated configuration.
    pub fn new(config: CustodianConfig, store: Arc<S>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &CustodianConfig {
        &self.config
    }

    /// Create a confidential record owned by the caller.
    ///
    /// The owner is the submitting identity's full enrollment DN; the
    /// caller's organization becomes the owning organization for every
    /// later owner-matching rule.
    pub async fn create_asset(
        &self,
        caller: &CallerIdentity,
        input: CreateAssetInput,
    ) -> Result<Asset> {
        input.validate()?;

        let existing = self.store.get(&self.config.collection, &input.asset_id).await?;
        if existing.map(|bytes| !bytes.is_empty()).unwrap_or(false) {
            return Err(CustodyError::AssetAlreadyExists(input.asset_id));
        }

        policy::ensure_unrestricted(caller, "create asset")?;
        policy::ensure_local_peer(caller, &self.config.peer_org)?;

        let asset = Asset {
            asset_id: input.asset_id,
            pointer: input.pointer,
            data_subject: input.data_subject,
            version: input.version,
            owner: caller.enrollment_id.clone(),
            filekey: input.filekey,
            acl: input.acl,
        };
        self.store
            .put(&self.config.collection, &asset.asset_id, &asset.to_bytes()?)
            .await?;

        self.append_audit(
            AuditEntry::new(
                AuditKind::Creation,
                &asset.asset_id,
                &caller.org,
                &caller.common_name,
            )
            .with_collection(&self.config.collection),
        )
        .await?;

        info!(
            asset_id = %asset.asset_id,
            org = %caller.org,
            collection = %self.config.collection,
            "asset created"
        );
        Ok(asset)
    }

    /// Read a record, returning its formatted projection.
    ///
    /// Modeled as a state-changing operation: every successful read appends
    /// a `_read` entry to the public trail.
    pub async fn read_asset(&self, caller: &CallerIdentity, asset_id: &str) -> Result<String> {
        let asset = self.load_asset(asset_id).await?;

        policy::ensure_acl_member(caller, &asset)?;
        policy::ensure_subject_self(caller, &asset.data_subject, "read")?;

        self.append_audit(AuditEntry::new(
            AuditKind::Read,
            asset_id,
            &caller.org,
            &caller.common_name,
        ))
        .await?;

        debug!(asset_id, org = %caller.org, "asset read");
        Ok(format!(
            "Asset ID: {},  Data Subject: {},  Version: {},  Owner: {},  File Key: {},  Pointer: {}",
            asset.asset_id,
            asset.data_subject,
            asset.version,
            asset.owner,
            asset.filekey,
            asset.pointer
        ))
    }

    /// Read a record's ACL as an encoded list. Owner organization only;
    /// leaves no audit entry.
    pub async fn read_acl(&self, caller: &CallerIdentity, asset_id: &str) -> Result<String> {
        let asset = self.load_asset(asset_id).await?;

        policy::ensure_owner_org(caller, &asset, "read the ACL of")?;
        policy::ensure_subject_self(caller, &asset.data_subject, "read the ACL of")?;

        debug!(asset_id, org = %caller.org, "acl read");
        Ok(format!("[{}]", asset.acl.join(", ")))
    }

    /// Grant an organization read access by appending it to the ACL.
    pub async fn update_acl_permission(
        &self,
        caller: &CallerIdentity,
        asset_id: &str,
        new_org: &str,
    ) -> Result<()> {
        let mut asset = self.load_asset(asset_id).await?;

        policy::ensure_owner_org(caller, &asset, "update")?;
        policy::ensure_unrestricted(caller, "update the ACL of an asset")?;

        asset.grant(new_org);
        self.store
            .put(&self.config.collection, asset_id, &asset.to_bytes()?)
            .await?;

        self.append_audit(
            AuditEntry::new(AuditKind::Acl, asset_id, &caller.org, &caller.common_name)
                .with_acl_change(new_org, AclChange::Granted),
        )
        .await?;

        info!(asset_id, org = %caller.org, new_org, "acl granted");
        Ok(())
    }

    /// Revoke an organization's read access. No-op when the organization is
    /// not on the ACL; the audit entry is written either way.
    pub async fn revoke_acl_permission(
        &self,
        caller: &CallerIdentity,
        asset_id: &str,
        target_org: &str,
    ) -> Result<()> {
        let mut asset = self.load_asset(asset_id).await?;

        policy::ensure_owner_org(caller, &asset, "revoke access rights for")?;
        policy::ensure_subject_self(caller, &asset.data_subject, "revoke access rights for")?;

        asset.revoke(target_org);
        self.store
            .put(&self.config.collection, asset_id, &asset.to_bytes()?)
            .await?;

        self.append_audit(
            AuditEntry::new(AuditKind::Acl, asset_id, &caller.org, &caller.common_name)
                .with_acl_change(target_org, AclChange::Revoked),
        )
        .await?;

        info!(asset_id, org = %caller.org, target_org, "acl revoked");
        Ok(())
    }

    /// Delete a record's confidential entry, leaving the deletion tombstone
    /// on the public trail. History of the confidential entry survives; use
    /// [`purge_asset`](Self::purge_asset) to remove it.
    pub async fn delete_asset(&self, caller: &CallerIdentity, asset_id: &str) -> Result<()> {
        let asset = self.load_asset(asset_id).await?;

        policy::ensure_local_peer(caller, &self.config.peer_org)?;
        policy::ensure_subject_self(caller, &asset.data_subject, "delete")?;
        policy::ensure_owner_org(caller, &asset, "delete")?;

        self.store.delete(&self.config.collection, asset_id).await?;

        self.append_audit(
            AuditEntry::new(
                AuditKind::Deletion,
                asset_id,
                &caller.org,
                &caller.common_name,
            )
            .with_data_subject(&asset.data_subject)
            .with_collection(&self.config.collection),
        )
        .await?;

        info!(asset_id, org = %caller.org, "asset deleted");
        Ok(())
    }

    /// Purge the durable history of a record's confidential entry.
    ///
    /// Idempotent: the record may already be deleted, or may never have
    /// existed, so there is no exists check. Leaves no audit entry.
    pub async fn purge_asset(&self, caller: &CallerIdentity, asset_id: &str) -> Result<()> {
        policy::ensure_local_peer(caller, &self.config.peer_org)?;

        self.store.purge(&self.config.collection, asset_id).await?;
        info!(asset_id, org = %caller.org, "asset purged");
        Ok(())
    }

    /// Record a request for access to a record. Writes the `_request` entry
    /// only; no state changes, and no grant is implied.
    pub async fn request_permission(
        &self,
        caller: &CallerIdentity,
        asset_id: &str,
        purpose: &str,
    ) -> Result<()> {
        policy::ensure_unrestricted(caller, "request access to an asset")?;

        self.append_audit(
            AuditEntry::new(
                AuditKind::Request,
                asset_id,
                &caller.org,
                &caller.common_name,
            )
            .with_purpose(purpose),
        )
        .await?;

        info!(asset_id, org = %caller.org, "access requested");
        Ok(())
    }

    /// Subject-erasure request, two-phase.
    ///
    /// When the record is still present this behaves like a delete followed
    /// by an erasure entry. When it is already gone, authorization is
    /// recovered from the deletion tombstone: the caller must be the
    /// recorded deleting organization (and the recorded subject, for the
    /// patient role). Either way the receipt is the full `_read` history
    /// recorded for the asset, comma-joined. Repeated requests after a
    /// successful erasure succeed again and return the same receipt.
    pub async fn erase_data_request(
        &self,
        caller: &CallerIdentity,
        asset_id: &str,
    ) -> Result<String> {
        let stored = self
            .store
            .get(&self.config.collection, asset_id)
            .await?
            .filter(|bytes| !bytes.is_empty());

        match stored {
            Some(bytes) => {
                let asset = Asset::from_bytes(&bytes)?;
                policy::ensure_owner_org(caller, &asset, "erase")?;
                policy::ensure_subject_self(caller, &asset.data_subject, "erase")?;

                self.store.delete(&self.config.collection, asset_id).await?;
                self.append_audit(
                    AuditEntry::new(
                        AuditKind::Deletion,
                        asset_id,
                        &caller.org,
                        &caller.common_name,
                    )
                    .with_data_subject(&asset.data_subject)
                    .with_collection(&self.config.collection),
                )
                .await?;
                self.append_audit(
                    AuditEntry::new(
                        AuditKind::Erasure,
                        asset_id,
                        &caller.org,
                        &caller.common_name,
                    )
                    .with_collection(&self.config.collection),
                )
                .await?;

                info!(asset_id, org = %caller.org, "asset erased");
                self.read_receipt(asset_id).await
            }
            None => {
                let deletions = self
                    .store
                    .history_of(&audit_key(asset_id, AuditKind::Deletion))
                    .await?;
                let Some(latest) = deletions.last() else {
                    return Err(CustodyError::AssetNotFound(format!(
                        "asset {asset_id} not found"
                    )));
                };

                let deletion = AuditEntry::from_json(latest)?;
                if deletion.asset_id != asset_id {
                    return Err(CustodyError::AssetNotFound(format!(
                        "asset {asset_id} not found"
                    )));
                }
                if deletion.actor_org != caller.org {
                    return Err(CustodyError::InvalidAccess(format!(
                        "caller {} with role {} is not authorized to erase asset {asset_id}",
                        caller.org, caller.role
                    )));
                }
                let recorded_subject = deletion.data_subject.as_deref().unwrap_or("");
                policy::ensure_subject_self(caller, recorded_subject, "erase")?;

                self.append_audit(
                    AuditEntry::new(
                        AuditKind::Erasure,
                        asset_id,
                        &caller.org,
                        &caller.common_name,
                    )
                    .with_collection(&self.config.collection),
                )
                .await?;

                info!(asset_id, org = %caller.org, "residual trail erased");
                self.read_receipt(asset_id).await
            }
        }
    }

    /// Register opaque key material for the caller's organization in the
    /// public space, keyed `<org>_<keyType>`.
    pub async fn upload_key(&self, caller: &CallerIdentity, input: UploadKeyInput) -> Result<()> {
        input.validate()?;

        let key_id = format!("{}_{}", caller.org, input.key_type);
        self.store.put_public(&key_id, &input.key).await?;
        info!(org = %caller.org, key_type = %input.key_type, "key registered");
        Ok(())
    }

    /// All records with `start <= assetID < end` in lexical order, skipping
    /// empty or malformed entries with a diagnostic.
    ///
    /// Point-in-time metadata query: results are not ACL-filtered and must
    /// never feed a write decision.
    pub async fn get_asset_by_range(&self, start: &str, end: &str) -> Result<Vec<Asset>> {
        let rows = self
            .store
            .range_query(&self.config.collection, start, end)
            .await?;
        debug!(start, end, rows = rows.len(), "range query");
        Ok(query::decode_rows(rows))
    }

    /// Comma-joined `assetID-ownerOrg` listing of every record about a data
    /// subject.
    ///
    /// Point-in-time metadata query over a selector: results are not
    /// ACL-filtered, may see phantoms under concurrent writers, and must
    /// never feed a write decision.
    pub async fn query_asset_by_patient(&self, data_subject: &str) -> Result<String> {
        let selector = Selector::field_equals("dataSubject", data_subject);
        let rows = self
            .store
            .rich_query(&self.config.collection, &selector)
            .await?;
        debug!(data_subject, rows = rows.len(), "subject query");
        Ok(query::owner_listing(&query::decode_rows(rows)))
    }

    /// Comma-joined history of a public-space key, oldest to newest.
    pub async fn history_for_asset(&self, key: &str) -> Result<String> {
        Ok(self.store.history_of(key).await?.join(","))
    }

    async fn load_asset(&self, asset_id: &str) -> Result<Asset> {
        let bytes = self
            .store
            .get(&self.config.collection, asset_id)
            .await?
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| CustodyError::AssetNotFound(format!("asset {asset_id} not found")))?;
        Asset::from_bytes(&bytes)
    }

    async fn append_audit(&self, entry: AuditEntry) -> Result<()> {
        self.store.put_public(&entry.key(), &entry.to_json()?).await?;
        Ok(())
    }

    async fn read_receipt(&self, asset_id: &str) -> Result<String> {
        Ok(self
            .store
            .history_of(&audit_key(asset_id, AuditKind::Read))
            .await?
            .join(","))
    }
}
