//! Content-addressed comparison primitives.
//!
//! Row hashing, Merkle tree construction and leaf diffs. Two exports holding
//! the same logical rows produce the same root regardless of row order,
//! column order or cosmetic formatting.

pub mod content;
mod diff;
mod hash;
pub mod merkle;

pub use content::{hash_row, identity_preimage, sort_preimage, RowDigest};
pub use diff::{compare_trees, diff_leaves, diff_trees, Comparison};
pub use hash::{Hash256, InvalidHash};
pub use merkle::{combine, MerkleTree, TreeNode};

// JSON-based entry point for embedding hosts
pub use diff::diff_leaves_json;
pub(crate) use diff::error_json;
