//! Shomer - record custodian for shared subject data
//!
//! "Am I my brother's keeper?" - Genesis 4:9
//!
//! Shomer is the authorization and audit core that sits between callers and
//! a replicated, append-only record store shared by mutually distrustful
//! organizations. Each confidential record has an owning organization, a
//! designated data subject, and an ACL of organizations cleared to read it;
//! every access, mutation, and erasure leaves an immutable entry on a public
//! audit trail.
//!
//! ## Components
//!
//! - **Store**: the ledger substrate seam ([`RecordStore`]) plus an
//!   in-memory reference backend
//! - **Identity**: the verified caller assertion and owner-org derivation
//! - **Asset**: the confidential record model and canonical codec
//! - **Policy**: pure per-rule authorization checks
//! - **Audit**: structured, deterministic public-trail entries
//! - **Custodian**: per-operation orchestration, including the two-phase
//!   erasure protocol correlated against deletion tombstones
//!
//! The substrate - consensus, replication, identity issuance, transport -
//! stays outside: the custodian trusts the store for durability and
//! ordering, and trusts the caller identity to arrive verified.

pub mod asset;
pub mod audit;
pub mod config;
pub mod custodian;
pub mod error;
pub mod identity;
pub mod policy;
pub mod query;
pub mod store;

pub use asset::Asset;
pub use audit::{audit_key, AclChange, AuditEntry, AuditKind};
pub use config::{CustodianConfig, DEFAULT_COLLECTION};
pub use custodian::{CreateAssetInput, Custodian, UploadKeyInput};
pub use error::{CustodyError, Result, StoreError};
pub use identity::{owner_org, CallerIdentity, Role};
pub use store::{KeyValue, MemoryStore, RecordStore, Selector};
