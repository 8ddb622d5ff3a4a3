//! Public audit trail entries
//!
//! Every state-changing operation, and reads of confidential records, leave
//! an immutable entry on the public log under the deterministic key
//! `<assetID>_<suffix>`. Entries are structured documents with deterministic
//! JSON serialization, so the erasure-correlation protocol can parse fields
//! instead of splitting prose.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CustodyError, Result};

/// Kind of audit entry; determines the key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Read,
    Creation,
    Acl,
    Deletion,
    Erasure,
    Request,
}

impl AuditKind {
    /// Key suffix for this kind.
    pub fn suffix(&self) -> &'static str {
        match self {
            AuditKind::Read => "read",
            AuditKind::Creation => "creation",
            AuditKind::Acl => "acl",
            AuditKind::Deletion => "deletion",
            AuditKind::Erasure => "erasure",
            AuditKind::Request => "request",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Direction of an ACL change recorded in an `_acl` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclChange {
    Granted,
    Revoked,
}

/// One immutable, publicly readable audit entry.
///
/// The public trail deliberately exposes only what each kind needs: deletion
/// entries carry the data subject (the erasure correlation depends on it),
/// ACL entries carry the target organization, request entries carry the
/// stated purpose. Everything else stays in the confidential collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry kind.
    pub kind: AuditKind,
    /// Asset the entry is about.
    pub asset_id: String,
    /// Organization of the acting identity.
    pub actor_org: String,
    /// Common name of the acting identity; empty when unknown.
    pub actor_id: String,
    /// Data subject of the record; only set on deletion entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_subject: Option<String>,
    /// Organization granted or revoked; only set on ACL entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_org: Option<String>,
    /// Whether the target organization was granted or revoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl_change: Option<AclChange>,
    /// Collection the record lived in; set on creation, deletion, erasure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// Stated usage purpose; only set on access requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// New entry for an action by `actor` on `asset_id`, stamped now.
    pub fn new(
        kind: AuditKind,
        asset_id: impl Into<String>,
        actor_org: impl Into<String>,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            asset_id: asset_id.into(),
            actor_org: actor_org.into(),
            actor_id: actor_id.into(),
            data_subject: None,
            target_org: None,
            acl_change: None,
            collection: None,
            purpose: None,
            recorded_at: Utc::now(),
        }
    }

    /// Record the data subject (deletion entries).
    pub fn with_data_subject(mut self, subject: impl Into<String>) -> Self {
        self.data_subject = Some(subject.into());
        self
    }

    /// Record an ACL change target.
    pub fn with_acl_change(mut self, target_org: impl Into<String>, change: AclChange) -> Self {
        self.target_org = Some(target_org.into());
        self.acl_change = Some(change);
        self
    }

    /// Record the collection the record lived in.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Record the stated usage purpose.
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Deterministic public-log key: `<assetID>_<suffix>`.
    pub fn key(&self) -> String {
        audit_key(&self.asset_id, self.kind)
    }

    /// Serialize for the public log.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CustodyError::Data(e.to_string()))
    }

    /// Parse an entry back out of the public log.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| CustodyError::Data(e.to_string()))
    }
}

/// Public-log key for an asset and entry kind.
pub fn audit_key(asset_id: &str, kind: AuditKind) -> String {
    format!("{}_{}", asset_id, kind.suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_kind_suffix() {
        let entry = AuditEntry::new(AuditKind::Deletion, "asset1", "Org1MSP", "doctor1");
        assert_eq!(entry.key(), "asset1_deletion");
        assert_eq!(audit_key("asset1", AuditKind::Read), "asset1_read");
        assert_eq!(audit_key("asset1", AuditKind::Request), "asset1_request");
    }

    #[test]
    fn json_round_trip() {
        let entry = AuditEntry::new(AuditKind::Deletion, "asset1", "Org1MSP", "doctor1")
            .with_data_subject("patient7")
            .with_collection("medCollection");
        let raw = entry.to_json().unwrap();
        let parsed = AuditEntry::from_json(&raw).unwrap();
        assert_eq!(parsed, entry);
        assert_eq!(parsed.data_subject.as_deref(), Some("patient7"));
    }

    #[test]
    fn unset_context_fields_are_omitted() {
        let entry = AuditEntry::new(AuditKind::Read, "asset1", "Org2MSP", "doctor2");
        let raw = entry.to_json().unwrap();
        assert!(!raw.contains("data_subject"));
        assert!(!raw.contains("target_org"));
        assert!(!raw.contains("purpose"));
    }

    #[test]
    fn acl_change_fields() {
        let entry = AuditEntry::new(AuditKind::Acl, "asset1", "Org1MSP", "doctor1")
            .with_acl_change("Org3MSP", AclChange::Granted);
        let parsed = AuditEntry::from_json(&entry.to_json().unwrap()).unwrap();
        assert_eq!(parsed.target_org.as_deref(), Some("Org3MSP"));
        assert_eq!(parsed.acl_change, Some(AclChange::Granted));
    }

    #[test]
    fn malformed_entry_is_data_error() {
        let err = AuditEntry::from_json("Asset asset1 was deleted by Org1MSP").unwrap_err();
        assert_eq!(err.kind(), "DATA_ERROR");
    }
}
