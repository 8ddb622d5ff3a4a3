//! Authorization rules
//!
//! Pure per-rule checks evaluated against the caller identity and the
//! current record state. Operations in the custodian compose these in a
//! fixed order; a denial anywhere stops the operation before any state or
//! audit write happens.
//!
//! Rules:
//! - peer-org guard: writes only through a peer of the caller's own org
//! - ACL membership: reads require the caller's org on the record's ACL
//! - owner-org match: owner operations require the org derived from the
//!   record's owner DN
//! - subject-self carve-out: a patient-role caller may only touch records
//!   whose data subject is themselves
//! - unrestricted-role: some operations are closed to the patient role
//!   entirely

use tracing::warn;

use crate::asset::Asset;
use crate::error::{CustodyError, Result};
use crate::identity::{owner_org, CallerIdentity, Role};

/// Deny the restricted patient role outright.
pub fn ensure_unrestricted(caller: &CallerIdentity, action: &str) -> Result<()> {
    if caller.role == Role::Patient {
        let message = format!(
            "caller with role {} is not authorized to {action}",
            caller.role
        );
        warn!(org = %caller.org, action, "denied: restricted role");
        return Err(CustodyError::InvalidAccess(message));
    }
    Ok(())
}

/// Require the caller's organization to match the local peer's.
///
/// Keeps a client of one organization from reading or writing private data
/// through another organization's peer.
pub fn ensure_local_peer(caller: &CallerIdentity, peer_org: &str) -> Result<()> {
    if caller.org != peer_org {
        let message = format!(
            "caller from org {} is not authorized to use private data on an org {peer_org} peer",
            caller.org
        );
        warn!(org = %caller.org, peer_org, "denied: foreign peer");
        return Err(CustodyError::InvalidAccess(message));
    }
    Ok(())
}

/// Require the caller's organization on the record's ACL.
pub fn ensure_acl_member(caller: &CallerIdentity, asset: &Asset) -> Result<()> {
    if !asset.acl_contains(&caller.org) {
        let message = format!(
            "caller {} with role {} is not authorized to read asset {}",
            caller.org, caller.role, asset.asset_id
        );
        warn!(org = %caller.org, asset_id = %asset.asset_id, "denied: not on ACL");
        return Err(CustodyError::InvalidAccess(message));
    }
    Ok(())
}

/// Require the caller's organization to be the record's owning organization.
///
/// The owning organization is derived from the record's owner DN through
/// [`owner_org`]; an underivable owner matches no caller.
pub fn ensure_owner_org(caller: &CallerIdentity, asset: &Asset, action: &str) -> Result<()> {
    let derived = owner_org(&asset.owner);
    if derived.as_deref() != Some(caller.org.as_str()) {
        let message = format!(
            "caller {} with role {} is not authorized to {action} asset {} owned by {}",
            caller.org,
            caller.role,
            asset.asset_id,
            derived.as_deref().unwrap_or("an unknown org")
        );
        warn!(org = %caller.org, asset_id = %asset.asset_id, action, "denied: not owner org");
        return Err(CustodyError::InvalidAccess(message));
    }
    Ok(())
}

/// Subject-self carve-out: a patient-role caller may only act on records
/// about themselves. Unrestricted callers pass unconditionally.
pub fn ensure_subject_self(caller: &CallerIdentity, data_subject: &str, action: &str) -> Result<()> {
    if caller.role == Role::Patient && caller.common_name != data_subject {
        let message = format!(
            "patient {} is not authorized to {action} a record of {data_subject}",
            caller.common_name
        );
        warn!(
            caller_cn = %caller.common_name,
            data_subject,
            action,
            "denied: subject mismatch"
        );
        return Err(CustodyError::InvalidAccess(message));
    }
    Ok(())
}
