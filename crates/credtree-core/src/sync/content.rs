//! Deterministic content hashing for credential rows.
//!
//! Each row yields two independent SHA-256 digests over its normalized,
//! selected values:
//!
//! - the identity hash, the Merkle leaf, over the values joined with `|` in
//!   fixed field order (title, username, password, last_modified)
//! - the sort hash, over a key-sorted JSON object of the same values, used
//!   only to order leaves and dropped once the tree is built
//!
//! Neither depends on the order in which the caller selected fields.

use std::collections::BTreeMap;

use serde::Serialize;

use super::hash::Hash256;
use crate::normalize::NormalizedRow;

/// Separator between values in the identity preimage
const VALUE_SEP: &str = "|";

/// Both hashes of a row plus its display title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDigest {
    pub identity: Hash256,
    /// Ordering key only; never rendered
    #[serde(skip)]
    pub sort_key: Hash256,
    pub title: Option<String>,
}

/// Identity preimage: selected values joined in fixed field order.
pub fn identity_preimage(row: &NormalizedRow) -> String {
    row.iter()
        .map(|(_, value)| value)
        .collect::<Vec<_>>()
        .join(VALUE_SEP)
}

/// Sort preimage: compact JSON object with keys in sorted order.
pub fn sort_preimage(row: &NormalizedRow) -> String {
    let map: BTreeMap<&str, &str> = row.iter().map(|(f, v)| (f.as_str(), v)).collect();
    // A map of string pairs always serializes
    serde_json::to_string(&map).unwrap_or_default()
}

/// Hash a normalized row synchronously.
///
/// Returns `None` for a row with no selected values; callers short-circuit
/// an empty selection before reaching this point.
pub fn hash_row(row: &NormalizedRow) -> Option<RowDigest> {
    if row.is_empty() {
        return None;
    }
    Some(RowDigest {
        identity: Hash256::digest(identity_preimage(row).as_bytes()),
        sort_key: Hash256::digest(sort_preimage(row).as_bytes()),
        title: row.title().map(str::to_string),
    })
}
