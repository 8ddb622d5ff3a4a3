//! Query projections
//!
//! Tolerant decoding and listing projections for range and rich queries.
//! Queries here are point-in-time and apply no per-result ACL filtering:
//! they expose the `assetID`/owner-org mapping as metadata and must never
//! feed a write decision.

use tracing::warn;

use crate::asset::Asset;
use crate::identity::owner_org;
use crate::store::KeyValue;

/// Decode query rows into assets, skipping empty or malformed entries with
/// a diagnostic instead of failing the whole query.
pub fn decode_rows(rows: Vec<KeyValue>) -> Vec<Asset> {
    let mut assets = Vec::with_capacity(rows.len());
    for row in rows {
        if row.value.is_empty() {
            warn!(key = %row.key, "skipping empty record");
            continue;
        }
        match Asset::from_bytes(&row.value) {
            Ok(asset) => assets.push(asset),
            Err(err) => {
                warn!(key = %row.key, error = %err, "skipping malformed record");
            }
        }
    }
    assets
}

/// Project assets into the comma-joined `assetID-ownerOrg` listing.
pub fn owner_listing(assets: &[Asset]) -> String {
    assets
        .iter()
        .map(|asset| {
            let org = owner_org(&asset.owner).unwrap_or_else(|| "unknown".to_string());
            format!("{}-{}", asset.asset_id, org)
        })
        .collect::<Vec<_>>()
        .join(",")
}
