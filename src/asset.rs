//! Confidential record model and codec
//!
//! An [`Asset`] is the unit of custody: one confidential record with an
//! owning identity, a designated data subject, and the ACL of organizations
//! cleared to read it. Canonical form is a JSON object with exactly the wire
//! field names; anything missing or mistyped fails decoding.

use serde::{Deserialize, Serialize};

use crate::error::{CustodyError, Result};

/// A confidential record.
///
/// `asset_id` is the primary identity and immutable once created, as are all
/// fields except `acl`, which the owner organization may grow and shrink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Unique key within the confidential collection.
    #[serde(rename = "assetID")]
    pub asset_id: String,
    /// Opaque reference to the off-store content location.
    pub pointer: String,
    /// Identifier of the person the record is about.
    #[serde(rename = "dataSubject")]
    pub data_subject: String,
    /// Record version, set at creation, at least 1.
    pub version: u32,
    /// Full distinguished-name string of the creating identity.
    pub owner: String,
    /// Opaque key material reference.
    pub filekey: String,
    /// Organizations permitted to read the record. The owner's organization
    /// is authorized through the owner-match rule independently of this
    /// list.
    pub acl: Vec<String>,
}

impl Asset {
    /// Canonical serialization.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CustodyError::Data(e.to_string()))
    }

    /// Decode a stored record; any absent or mistyped field is a data error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| CustodyError::Data(e.to_string()))
    }

    /// Append an organization to the ACL.
    ///
    /// Appends unconditionally; granting twice leaves two entries, and one
    /// revoke removes one of them, so grant-then-revoke always restores the
    /// prior membership state.
    pub fn grant(&mut self, org: impl Into<String>) {
        self.acl.push(org.into());
    }

    /// Remove the first occurrence of an organization from the ACL.
    /// No-op when the organization is absent.
    pub fn revoke(&mut self, org: &str) {
        if let Some(pos) = self.acl.iter().position(|entry| entry == org) {
            self.acl.remove(pos);
        }
    }

    /// Whether an organization appears in the ACL.
    pub fn acl_contains(&self, org: &str) -> bool {
        self.acl.iter().any(|entry| entry == org)
    }
}

/// Diagnostic equality over identity fields only: `asset_id`,
/// `data_subject`, `owner`, `version`. ACL, pointer, and filekey are
/// excluded. For tests and diagnostics, never for business decisions.
impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.asset_id == other.asset_id
            && self.data_subject == other.data_subject
            && self.owner == other.owner
            && self.version == other.version
    }
}

impl Eq for Asset {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Asset {
        Asset {
            asset_id: "asset1".into(),
            pointer: "s3://bucket/asset1".into(),
            data_subject: "patient7".into(),
            version: 1,
            owner: "CN=doctor1,O=org1.example.com,C=US".into(),
            filekey: "key-ref-1".into(),
            acl: vec!["Org2MSP".into()],
        }
    }

    #[test]
    fn codec_round_trip() {
        let asset = sample();
        let bytes = asset.to_bytes().unwrap();
        let decoded = Asset::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, asset);
        assert_eq!(decoded.acl, asset.acl);
        assert_eq!(decoded.pointer, asset.pointer);
    }

    #[test]
    fn wire_field_names() {
        let bytes = sample().to_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["assetID"], "asset1");
        assert_eq!(value["dataSubject"], "patient7");
        assert_eq!(value["filekey"], "key-ref-1");
    }

    #[test]
    fn missing_field_is_data_error() {
        let err = Asset::from_bytes(br#"{"assetID":"a1","version":1}"#).unwrap_err();
        assert_eq!(err.kind(), "DATA_ERROR");
    }

    #[test]
    fn mistyped_version_is_data_error() {
        let json = br#"{"assetID":"a1","pointer":"p","dataSubject":"s","version":"one","owner":"o","filekey":"f","acl":[]}"#;
        let err = Asset::from_bytes(json).unwrap_err();
        assert_eq!(err.kind(), "DATA_ERROR");
    }

    #[test]
    fn mistyped_acl_is_data_error() {
        let json = br#"{"assetID":"a1","pointer":"p","dataSubject":"s","version":1,"owner":"o","filekey":"f","acl":"Org2MSP"}"#;
        let err = Asset::from_bytes(json).unwrap_err();
        assert_eq!(err.kind(), "DATA_ERROR");
    }

    #[test]
    fn equality_ignores_mutable_and_opaque_fields() {
        let a = sample();
        let mut b = sample();
        b.acl = vec![];
        b.pointer = "elsewhere".into();
        b.filekey = "other".into();
        assert_eq!(a, b);

        let mut c = sample();
        c.version = 2;
        assert_ne!(a, c);

        let mut d = sample();
        d.data_subject = "patient8".into();
        assert_ne!(a, d);
    }

    #[test]
    fn grant_and_revoke_are_inverse() {
        let mut asset = sample();
        asset.grant("Org3MSP");
        assert!(asset.acl_contains("Org3MSP"));
        asset.revoke("Org3MSP");
        assert!(!asset.acl_contains("Org3MSP"));
        assert_eq!(asset.acl, vec!["Org2MSP".to_string()]);
    }

    #[test]
    fn revoke_absent_is_noop() {
        let mut asset = sample();
        asset.revoke("Org9MSP");
        assert_eq!(asset.acl, vec!["Org2MSP".to_string()]);
    }

    #[test]
    fn duplicate_grant_survives_one_revoke() {
        let mut asset = sample();
        asset.grant("Org2MSP");
        asset.revoke("Org2MSP");
        assert!(asset.acl_contains("Org2MSP"));
    }
}
