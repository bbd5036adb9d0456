//! Pipeline runner: rows in, Merkle tree out.
//!
//! [`compute_tree`] normalizes and hashes rows one at a time through a
//! [`Digester`], checking its [`RunToken`] after every digest. A run that has
//! been superseded returns [`Computation::Stale`] without building anything.
//!
//! [`build_tree_sync`] is the same pipeline without suspension points, used
//! by the JSON entry point and by callers that have no cancellation needs.

mod digest;
mod generation;
mod panel;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::csv::{self, CsvTable};
use crate::error::{PipelineError, PipelineResult};
use crate::normalize::{bind_headers, FieldName, FieldSpec, HeaderBinding, NormalizedRow, Selection};
use crate::sync::{hash_row, identity_preimage, sort_preimage, MerkleTree, RowDigest};

pub use digest::{Digester, Sha256Digester};
pub use generation::{Generation, GenerationCounter, RunToken};
pub use panel::{LoadStatus, Panel, PanelResult, RunStatus};

/// A tokenized file with its header bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    table: CsvTable,
    bindings: Vec<HeaderBinding>,
}

impl Dataset {
    /// Tokenize and bind. Returns `None` when there is no header row or no
    /// data row.
    pub fn from_text(text: &str, specs: &[FieldSpec]) -> Option<Self> {
        Self::from_table(csv::parse(text), specs)
    }

    pub fn from_table(table: CsvTable, specs: &[FieldSpec]) -> Option<Self> {
        if table.is_empty() {
            return None;
        }
        let bindings = bind_headers(specs, &table.headers);
        Some(Self { table, bindings })
    }

    pub fn table(&self) -> &CsvTable {
        &self.table
    }

    pub fn bindings(&self) -> &[HeaderBinding] {
        &self.bindings
    }

    pub fn row_count(&self) -> usize {
        self.table.rows.len()
    }

    /// Fields with a header in this file
    pub fn available_fields(&self) -> Selection {
        Selection::all_bound(&self.bindings)
    }

    /// Limit a requested selection to bound fields, logging what was dropped.
    fn effective_selection(&self, requested: &Selection) -> Selection {
        let mut selection = requested.clone();
        let dropped = selection.restrict_to(&self.bindings);
        if !dropped.is_empty() {
            let names: Vec<&str> = dropped.iter().map(FieldName::as_str).collect();
            warn!(fields = ?names, "selected fields have no matching header; ignoring");
        }
        selection
    }
}

/// Why a run produced no tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// No header row or no data rows
    NoData,
    /// No bound field selected
    NoSelection,
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Computation {
    /// A tree over the fields actually hashed, which may be fewer than
    /// requested when some have no matching column
    Tree { tree: MerkleTree, selection: Selection },
    Empty(EmptyReason),
    /// Superseded by a newer generation; nothing was built
    Stale,
}

/// Normalize, hash and build a tree, abandoning as soon as `token` goes stale.
pub async fn compute_tree<D: Digester>(
    digester: &D,
    dataset: &Dataset,
    selection: &Selection,
    token: &RunToken<'_>,
) -> PipelineResult<Computation> {
    if token.is_stale() {
        return Ok(Computation::Stale);
    }

    let selection = dataset.effective_selection(selection);
    if selection.is_empty() {
        return Ok(Computation::Empty(EmptyReason::NoSelection));
    }

    let generation = token.generation();
    debug!(%generation, rows = dataset.row_count(), fields = selection.len(), "hashing rows");

    let mut digests = Vec::with_capacity(dataset.row_count());
    for (index, raw) in dataset.table.rows.iter().enumerate() {
        let row = NormalizedRow::from_raw(raw, &dataset.bindings, &selection);

        let identity = digester.sha256(identity_preimage(&row).as_bytes()).await;
        if token.is_stale() {
            debug!(%generation, row = index, "run superseded; abandoning");
            return Ok(Computation::Stale);
        }
        let identity = identity.map_err(|source| PipelineError::Digest { row: index, source })?;

        let sort_key = digester.sha256(sort_preimage(&row).as_bytes()).await;
        if token.is_stale() {
            debug!(%generation, row = index, "run superseded; abandoning");
            return Ok(Computation::Stale);
        }
        let sort_key = sort_key.map_err(|source| PipelineError::Digest { row: index, source })?;

        digests.push(RowDigest {
            identity,
            sort_key,
            title: row.title().map(str::to_string),
        });
    }

    Ok(match MerkleTree::build(digests) {
        Some(tree) => Computation::Tree { tree, selection },
        None => Computation::Empty(EmptyReason::NoData),
    })
}

/// Synchronous pipeline over an already tokenized table.
///
/// Returns `None` for an empty table or an empty effective selection.
pub fn build_tree_sync(
    table: &CsvTable,
    bindings: &[HeaderBinding],
    selection: &Selection,
) -> Option<MerkleTree> {
    let mut selection = selection.clone();
    selection.restrict_to(bindings);
    if selection.is_empty() || !table.has_headers() {
        return None;
    }

    let digests = table
        .rows
        .iter()
        .filter_map(|raw| hash_row(&NormalizedRow::from_raw(raw, bindings, &selection)))
        .collect();
    MerkleTree::build(digests)
}

/// Shared dataset handle used by panels
pub(crate) type SharedDataset = Arc<Dataset>;

// ============================================================================
// JSON entry point for embedding hosts
// ============================================================================

/// Build a tree from CSV text.
/// Input: `{"csv":"...","fields":["title","password",...]}`; `fields` may be
/// omitted to select every bound field.
/// Output: `{"root":"<hex>","leaves":N,"levels":[[{"hash":...,"title":...,"duplicate":bool}]]}`,
/// `{"empty":true,"reason":"no_data"|"no_selection"}` or `{"error":"..."}`
pub fn tree_from_csv_json(input: &str) -> String {
    #[derive(Deserialize)]
    struct Input {
        csv: String,
        #[serde(default)]
        fields: Option<Vec<String>>,
    }

    let parsed: Input = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => return crate::sync::error_json(&format!("invalid JSON: {e}")),
    };

    let mut fields = Vec::new();
    for name in parsed.fields.iter().flatten() {
        match name.parse::<FieldName>() {
            Ok(f) => fields.push(f),
            Err(e) => return crate::sync::error_json(&e.to_string()),
        }
    }

    let dataset = match Dataset::from_text(&parsed.csv, &FieldSpec::defaults()) {
        Some(d) => d,
        None => return empty_json(EmptyReason::NoData),
    };
    let selection = match parsed.fields {
        Some(_) => Selection::from_fields(fields),
        None => dataset.available_fields(),
    };

    match build_tree_sync(dataset.table(), dataset.bindings(), &selection) {
        Some(tree) => serde_json::json!({
            "root": tree.root(),
            "leaves": tree.leaf_count(),
            "levels": tree.levels(),
        })
        .to_string(),
        None => empty_json(EmptyReason::NoSelection),
    }
}

fn empty_json(reason: EmptyReason) -> String {
    serde_json::json!({ "empty": true, "reason": reason }).to_string()
}
