//! Terminal rendering of trees and comparisons.
//!
//! Hashes are shortened to a configurable hex prefix everywhere except the
//! root line, which always shows the full digest for copying.

use std::collections::BTreeSet;
use std::io::{self, Write};

use credtree_core::normalize::{HeaderBinding, Selection};
use credtree_core::{Comparison, Hash256, MerkleTree};
use serde::Serialize;

const DUPLICATE_MARK: &str = "(dup)";
const UNTITLED: &str = "(untitled)";

/// A loaded side, as rendered
#[derive(Debug, Clone)]
pub struct PanelView<'a> {
    pub label: &'a str,
    pub rows: usize,
    pub selection: &'a Selection,
    pub tree: &'a MerkleTree,
}

fn field_list(selection: &Selection) -> String {
    selection
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Configured fields and the header each matched.
pub fn render_headers(out: &mut impl Write, label: &str, bindings: &[HeaderBinding]) -> io::Result<()> {
    writeln!(out, "{label}")?;
    for binding in bindings {
        let header = match &binding.header {
            Some(h) => format!("\"{h}\""),
            None => "missing".to_string(),
        };
        writeln!(
            out,
            "  {:<14} {:<14} {}",
            binding.spec.label,
            binding.spec.field.as_str(),
            header
        )?;
    }
    Ok(())
}

/// Levels leaf to root, then the full root hash.
pub fn render_tree(out: &mut impl Write, view: &PanelView<'_>, prefix_len: usize) -> io::Result<()> {
    writeln!(
        out,
        "{} ({} rows; fields: {})",
        view.label,
        view.rows,
        field_list(view.selection)
    )?;

    let top = view.tree.height() - 1;
    for (depth, level) in view.tree.levels().iter().enumerate() {
        let name = match depth {
            0 if top == 0 => "leaves/root".to_string(),
            0 => "leaves".to_string(),
            d if d == top => "root".to_string(),
            d => format!("level {d}"),
        };
        writeln!(out, "  [{name}] {} node(s)", level.len())?;
        for node in level {
            let note = if node.duplicate {
                DUPLICATE_MARK
            } else if depth == 0 {
                node.title.as_deref().unwrap_or(UNTITLED)
            } else {
                ""
            };
            writeln!(out, "    {}  {}", node.hash.prefix(prefix_len), note)?;
        }
    }
    writeln!(out, "  root: {}", view.tree.root())
}

fn render_flagged(
    out: &mut impl Write,
    heading: &str,
    flagged: &BTreeSet<Hash256>,
    tree: &MerkleTree,
    prefix_len: usize,
) -> io::Result<()> {
    writeln!(out, "{heading} ({}):", flagged.len())?;
    for hash in flagged {
        let title = tree.title_of(hash).unwrap_or(UNTITLED);
        writeln!(out, "  {}  {}", hash.prefix(prefix_len), title)?;
    }
    Ok(())
}

/// Both roots, match status and flagged rows per side.
pub fn render_comparison(
    out: &mut impl Write,
    left: &PanelView<'_>,
    right: &PanelView<'_>,
    comparison: &Comparison,
    prefix_len: usize,
) -> io::Result<()> {
    writeln!(out, "left:  {}  {} ({} rows)", left.tree.root(), left.label, left.rows)?;
    writeln!(out, "right: {}  {} ({} rows)", right.tree.root(), right.label, right.rows)?;
    writeln!(
        out,
        "status: {}",
        if comparison.roots_match { "MATCH" } else { "DIFFER" }
    )?;
    if comparison.roots_match {
        return Ok(());
    }
    render_flagged(out, "only in left", &comparison.left_only, left.tree, prefix_len)?;
    render_flagged(out, "only in right", &comparison.right_only, right.tree, prefix_len)
}

// ============================================================================
// JSON output
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TreeReport<'a> {
    pub file: &'a str,
    pub rows: usize,
    pub fields: &'a Selection,
    pub leaves: usize,
    #[serde(flatten)]
    pub tree: &'a MerkleTree,
}

impl<'a> From<&PanelView<'a>> for TreeReport<'a> {
    fn from(view: &PanelView<'a>) -> Self {
        Self {
            file: view.label,
            rows: view.rows,
            fields: view.selection,
            leaves: view.tree.leaf_count(),
            tree: view.tree,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FlaggedRow<'a> {
    pub hash: Hash256,
    pub title: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct SideReport<'a> {
    pub file: &'a str,
    pub rows: usize,
    pub root: Hash256,
    pub only_here: Vec<FlaggedRow<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonReport<'a> {
    pub roots_match: bool,
    pub fields: &'a Selection,
    pub left: SideReport<'a>,
    pub right: SideReport<'a>,
}

impl<'a> ComparisonReport<'a> {
    pub fn new(left: &PanelView<'a>, right: &PanelView<'a>, comparison: &Comparison) -> Self {
        let side = |view: &PanelView<'a>, flagged: &BTreeSet<Hash256>| SideReport {
            file: view.label,
            rows: view.rows,
            root: view.tree.root(),
            only_here: flagged
                .iter()
                .map(|h| FlaggedRow {
                    hash: *h,
                    title: view.tree.title_of(h),
                })
                .collect(),
        };
        Self {
            roots_match: comparison.roots_match,
            fields: left.selection,
            left: side(left, &comparison.left_only),
            right: side(right, &comparison.right_only),
        }
    }
}
