//! Leaf set difference between two trees.
//!
//! The difference is deliberately one-directional: it answers "which rows on
//! the candidate side are missing from the reference side". Comparing two
//! panels runs it once per direction.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::hash::Hash256;
use super::merkle::MerkleTree;

/// Candidate hashes absent from `reference`.
///
/// An empty reference or an empty candidate flags nothing.
pub fn diff_leaves<'a, I>(reference: &HashSet<Hash256>, candidate: I) -> BTreeSet<Hash256>
where
    I: IntoIterator<Item = &'a Hash256>,
{
    if reference.is_empty() {
        return BTreeSet::new();
    }
    candidate
        .into_iter()
        .filter(|h| !reference.contains(*h))
        .copied()
        .collect()
}

/// Real leaves of `candidate` missing from `reference`.
pub fn diff_trees(reference: &MerkleTree, candidate: &MerkleTree) -> BTreeSet<Hash256> {
    let reference = reference.leaf_hashes();
    diff_leaves(&reference, candidate.leaves().map(|n| &n.hash))
}

/// Outcome of comparing a left and a right tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// Both sides present and roots equal
    pub roots_match: bool,
    /// Left leaves missing on the right
    pub left_only: BTreeSet<Hash256>,
    /// Right leaves missing on the left
    pub right_only: BTreeSet<Hash256>,
}

impl Comparison {
    pub fn is_identical(&self) -> bool {
        self.roots_match && self.left_only.is_empty() && self.right_only.is_empty()
    }
}

/// Compare two optional trees in both directions.
///
/// With either side absent there is nothing to compare: roots do not match
/// and nothing is flagged.
pub fn compare_trees(left: Option<&MerkleTree>, right: Option<&MerkleTree>) -> Comparison {
    match (left, right) {
        (Some(l), Some(r)) => Comparison {
            roots_match: l.root() == r.root(),
            left_only: diff_trees(r, l),
            right_only: diff_trees(l, r),
        },
        _ => Comparison::default(),
    }
}

// ============================================================================
// JSON entry point for embedding hosts
// ============================================================================

/// Diff two hex leaf lists.
/// Input: `{"reference":["<hex>",...],"candidate":["<hex>",...]}`
/// Output: `{"flagged":["<hex>",...]}` or `{"error":"..."}`
pub fn diff_leaves_json(input: &str) -> String {
    #[derive(Deserialize)]
    struct Input {
        reference: Vec<String>,
        candidate: Vec<String>,
    }

    #[derive(Serialize)]
    struct Output {
        flagged: BTreeSet<Hash256>,
    }

    let parsed: Input = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => return error_json(&format!("invalid JSON: {e}")),
    };

    let decode = |list: &[String]| -> Result<Vec<Hash256>, String> {
        list.iter()
            .map(|h| Hash256::from_hex(h).map_err(|e| e.to_string()))
            .collect()
    };
    let reference: HashSet<Hash256> = match decode(&parsed.reference) {
        Ok(v) => v.into_iter().collect(),
        Err(e) => return error_json(&e),
    };
    let candidate = match decode(&parsed.candidate) {
        Ok(v) => v,
        Err(e) => return error_json(&e),
    };

    let output = Output {
        flagged: diff_leaves(&reference, &candidate),
    };
    serde_json::to_string(&output)
        .unwrap_or_else(|e| error_json(&format!("serialization failed: {e}")))
}

pub(crate) fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
