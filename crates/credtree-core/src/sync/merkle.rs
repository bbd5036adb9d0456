//! Binary Merkle tree over row identity hashes.
//!
//! Leaves are ordered by sort hash so the same logical rows always produce
//! the same tree, whatever order they appeared in. Odd levels are padded by
//! duplicating the last node, and parents are `SHA-256(SHA-256(left || right))`
//! over the raw 32-byte children.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::content::RowDigest;
use super::hash::Hash256;

/// One node of a tree level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub hash: Hash256,
    /// Row title; only real leaves carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Synthetic copy of the left sibling, inserted to even out a level
    #[serde(default)]
    pub duplicate: bool,
}

impl TreeNode {
    fn leaf(digest: RowDigest) -> Self {
        Self {
            hash: digest.identity,
            title: digest.title,
            duplicate: false,
        }
    }

    fn padding(&self) -> Self {
        Self {
            hash: self.hash,
            title: None,
            duplicate: true,
        }
    }

    fn parent(left: &TreeNode, right: &TreeNode) -> Self {
        Self {
            hash: combine(&left.hash, &right.hash),
            title: None,
            duplicate: false,
        }
    }
}

/// Parent hash of two children: double SHA-256 over their concatenated bytes.
pub fn combine(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_bytes());
    buf[32..].copy_from_slice(right.as_bytes());
    Hash256::double_digest(&buf)
}

/// Immutable Merkle tree, levels ordered leaf to root.
///
/// The last level always holds exactly one node whose hash is the root. A
/// single-leaf tree has one level and its root is that leaf's identity hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleTree {
    levels: Vec<Vec<TreeNode>>,
    root: Hash256,
}

impl MerkleTree {
    /// Build a tree from row digests. Returns `None` when there are none.
    pub fn build(mut leaves: Vec<RowDigest>) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }

        // Stable: rows with equal sort hashes keep input order
        leaves.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

        let leaf_count = leaves.len();
        let mut level: Vec<TreeNode> = leaves.into_iter().map(TreeNode::leaf).collect();
        let mut levels = Vec::new();

        loop {
            if level.len() > 1 && level.len() % 2 == 1 {
                if let Some(last) = level.last() {
                    let pad = last.padding();
                    level.push(pad);
                }
            }

            if level.len() == 1 {
                let root = level[0].hash;
                levels.push(level);
                debug!(leaves = leaf_count, height = levels.len(), root = %root.prefix(12), "merkle tree built");
                return Some(Self { levels, root });
            }

            let next = level
                .chunks_exact(2)
                .map(|pair| TreeNode::parent(&pair[0], &pair[1]))
                .collect();
            levels.push(level);
            level = next;
        }
    }

    pub fn root(&self) -> Hash256 {
        self.root
    }

    /// Levels from leaves (index 0) to root
    pub fn levels(&self) -> &[Vec<TreeNode>] {
        &self.levels
    }

    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// Real leaves in tree order, padding excluded
    pub fn leaves(&self) -> impl Iterator<Item = &TreeNode> {
        self.levels
            .first()
            .into_iter()
            .flatten()
            .filter(|n| !n.duplicate)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    pub fn leaf_hashes(&self) -> HashSet<Hash256> {
        self.leaves().map(|n| n.hash).collect()
    }

    /// Title of the first real leaf with this hash
    pub fn title_of(&self, hash: &Hash256) -> Option<&str> {
        self.leaves()
            .find(|n| &n.hash == hash)
            .and_then(|n| n.title.as_deref())
    }
}
