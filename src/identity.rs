//! Caller identity assertion
//!
//! One immutable identity per invocation, resolved from the verified
//! credential the substrate hands us: organization id, role attribute, and
//! the common name pulled out of the certificate subject. Also home of the
//! owner-organization derivation every owner-matching rule shares.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `CN=<value>,` inside a distinguished-name string.
static CN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"CN=(.*?),").expect("valid CN pattern"));

/// Caller role, resolved once from the credential's `role` attribute.
///
/// Roles form a closed set: either the caller acts for an organization, or
/// the caller is the data subject themselves and may only touch records
/// about themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Organization staff; reach is governed by org-level rules alone.
    #[default]
    Unrestricted,
    /// Data-subject self role; every rule additionally requires the caller's
    /// common name to equal the record's data subject.
    Patient,
}

impl Role {
    /// Resolve a role from the raw credential attribute.
    ///
    /// Only the exact attribute value `patient` marks the restricted role;
    /// anything else, including an absent attribute, is unrestricted.
    pub fn from_attribute(attribute: Option<&str>) -> Self {
        match attribute {
            Some("patient") => Role::Patient,
            _ => Role::Unrestricted,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Unrestricted => write!(f, "unrestricted"),
            Role::Patient => write!(f, "patient"),
        }
    }
}

/// Verified caller identity for a single invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Organization (MSP) id of the caller.
    pub org: String,
    /// Resolved role.
    pub role: Role,
    /// Full enrollment id: the distinguished-name string of the credential.
    pub enrollment_id: String,
    /// Common name extracted from the enrollment id; empty when the DN has
    /// no `CN=<value>,` component. The subject-self rule then fails closed,
    /// since an empty name never equals a real subject id.
    pub common_name: String,
}

impl CallerIdentity {
    /// Build an identity from the substrate-verified credential parts.
    pub fn from_credential(
        org: impl Into<String>,
        role_attribute: Option<&str>,
        enrollment_id: impl Into<String>,
    ) -> Self {
        let enrollment_id = enrollment_id.into();
        let common_name = extract_common_name(&enrollment_id);
        Self {
            org: org.into(),
            role: Role::from_attribute(role_attribute),
            enrollment_id,
            common_name,
        }
    }
}

/// Pull the common name out of a distinguished-name string.
fn extract_common_name(dn: &str) -> String {
    CN_PATTERN
        .captures(dn)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Derive the owning organization id from a record's owner DN.
///
/// The owner field stores the creating identity's full DN; its `O=`
/// component carries a domain like `org1.example.com`. The organization id
/// is the first domain label, capitalized, with the `MSP` suffix convention:
/// `org1.example.com` -> `Org1MSP`. When the DN carries several `O=`
/// components the last one wins.
///
/// Returns `None` when no `O=` component is present; callers treat an
/// underivable owner as matching no organization.
pub fn owner_org(owner_dn: &str) -> Option<String> {
    let mut derived = None;
    for part in owner_dn.split(',') {
        if let Some(domain) = part.trim().strip_prefix("O=") {
            let label = domain.split('.').next().unwrap_or(domain);
            let mut chars = label.chars();
            let capitalized = match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => continue,
            };
            derived = Some(format!("{capitalized}MSP"));
        }
    }
    derived
}
