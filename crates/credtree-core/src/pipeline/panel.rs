//! Per-panel pipeline state
//!
//! A panel holds one loaded export, its generation counter and the latest
//! published result. Loading a file or changing the selection starts a new
//! generation; only the run whose generation is still current when it
//! finishes may publish. Two panels share nothing.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{compute_tree, Computation, Dataset, Digester, EmptyReason, Generation, GenerationCounter, SharedDataset};
use crate::error::PipelineResult;
use crate::normalize::{FieldSpec, HeaderBinding, Selection};
use crate::sync::{Hash256, MerkleTree};

/// Outcome of loading text into a panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded {
        rows: usize,
        bindings: Vec<HeaderBinding>,
    },
    /// No header row or no data rows
    NoData,
}

/// Outcome of a recompute request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// This run's result is now the panel's latest
    Published(Generation),
    /// A newer run started first; nothing was published
    Stale,
}

/// A published result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelResult {
    pub generation: Generation,
    /// Fields the tree was built over; empty when there is no tree
    pub selection: Selection,
    /// Absent when there was nothing to hash
    pub tree: Option<MerkleTree>,
    pub empty_reason: Option<EmptyReason>,
}

impl PanelResult {
    pub fn root(&self) -> Option<Hash256> {
        self.tree.as_ref().map(MerkleTree::root)
    }

    pub fn leaf_hashes(&self) -> HashSet<Hash256> {
        self.tree
            .as_ref()
            .map(MerkleTree::leaf_hashes)
            .unwrap_or_default()
    }
}

/// One independent pipeline with its own state
pub struct Panel<D> {
    name: String,
    digester: D,
    specs: Vec<FieldSpec>,
    generation: GenerationCounter,
    dataset: Mutex<Option<SharedDataset>>,
    latest: Mutex<Option<Arc<PanelResult>>>,
}

impl<D: Digester> Panel<D> {
    pub fn new(name: impl Into<String>, digester: D, specs: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            digester,
            specs,
            generation: GenerationCounter::new(),
            dataset: Mutex::new(None),
            latest: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn digester(&self) -> &D {
        &self.digester
    }

    pub fn generation(&self) -> Generation {
        self.generation.current()
    }

    /// Replace the panel's file. Supersedes any run in flight and clears the
    /// published result.
    pub fn load(&self, text: &str) -> LoadStatus {
        let dataset = Dataset::from_text(text, &self.specs);
        let status = match &dataset {
            Some(d) => LoadStatus::Loaded {
                rows: d.row_count(),
                bindings: d.bindings().to_vec(),
            },
            None => LoadStatus::NoData,
        };

        let generation = self.replace_dataset(dataset.map(Arc::new));
        debug!(panel = %self.name, %generation, ?status, "loaded");
        status
    }

    /// Drop the loaded file and any result.
    pub fn clear(&self) {
        self.replace_dataset(None);
    }

    /// Swap the dataset and advance the generation under the dataset lock,
    /// so a run that captures the new generation also sees the new dataset.
    fn replace_dataset(&self, dataset: Option<SharedDataset>) -> Generation {
        let generation = {
            let mut slot = self.dataset.lock();
            let generation = self.generation.advance().generation();
            *slot = dataset;
            generation
        };
        self.retire_results_before(generation);
        generation
    }

    /// Clear the published result if it predates `generation`. A result
    /// published by a later run is kept.
    fn retire_results_before(&self, generation: Generation) {
        let mut latest = self.latest.lock();
        if latest.as_ref().is_some_and(|r| r.generation < generation) {
            *latest = None;
        }
    }

    pub fn bindings(&self) -> Vec<HeaderBinding> {
        self.dataset
            .lock()
            .as_ref()
            .map(|d| d.bindings().to_vec())
            .unwrap_or_default()
    }

    /// Fields that can be selected for the loaded file
    pub fn available_fields(&self) -> Selection {
        self.dataset
            .lock()
            .as_ref()
            .map(|d| d.available_fields())
            .unwrap_or_default()
    }

    /// Recompute the tree for `selection`, superseding any run in flight.
    ///
    /// A digest failure fails this run only; the previous result stays
    /// published.
    pub async fn recompute(&self, selection: &Selection) -> PipelineResult<RunStatus> {
        let (token, dataset) = {
            let slot = self.dataset.lock();
            (self.generation.advance(), slot.clone())
        };
        let generation = token.generation();

        let computation = match &dataset {
            Some(d) => compute_tree(&self.digester, d, selection, &token).await,
            None => Ok(Computation::Empty(EmptyReason::NoData)),
        };

        let computation = match computation {
            Ok(c) => c,
            Err(_) if token.is_stale() => return Ok(RunStatus::Stale),
            Err(e) => return Err(e),
        };

        let (tree, hashed, empty_reason) = match computation {
            Computation::Tree { tree, selection } => (Some(tree), selection, None),
            Computation::Empty(reason) => (None, Selection::new(), Some(reason)),
            Computation::Stale => return Ok(RunStatus::Stale),
        };

        let mut latest = self.latest.lock();
        if token.is_stale() {
            debug!(panel = %self.name, %generation, "finished after being superseded; discarding");
            return Ok(RunStatus::Stale);
        }
        match &tree {
            Some(t) => info!(panel = %self.name, %generation, leaves = t.leaf_count(), root = %t.root().prefix(12), "published tree"),
            None => info!(panel = %self.name, %generation, reason = ?empty_reason, "published empty result"),
        }
        *latest = Some(Arc::new(PanelResult {
            generation,
            selection: hashed,
            tree,
            empty_reason,
        }));
        Ok(RunStatus::Published(generation))
    }

    /// Latest published result
    pub fn latest(&self) -> Option<Arc<PanelResult>> {
        self.latest.lock().clone()
    }

    /// Leaf hashes of the latest published tree, empty if none
    pub fn leaf_hashes(&self) -> HashSet<Hash256> {
        self.latest()
            .map(|r| r.leaf_hashes())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::FieldName;
    use crate::pipeline::Sha256Digester;
    use pretty_assertions::assert_eq;

    const CSV: &str = "Title,Password,URL\nmail,pw1,x\nbank,pw2,y\n";

    fn panel() -> Panel<Sha256Digester> {
        Panel::new("left", Sha256Digester, FieldSpec::defaults())
    }

    #[test]
    fn load_reports_bindings() {
        let p = panel();
        match p.load(CSV) {
            LoadStatus::Loaded { rows, bindings } => {
                assert_eq!(rows, 2);
                assert_eq!(bindings.iter().filter(|b| b.is_bound()).count(), 2);
            }
            LoadStatus::NoData => panic!("expected data"),
        }
        assert_eq!(
            p.available_fields(),
            Selection::from_fields([FieldName::Title, FieldName::Password])
        );
    }

    #[test]
    fn load_without_data() {
        let p = panel();
        assert_eq!(p.load("\n\n"), LoadStatus::NoData);
        assert!(p.bindings().is_empty());
    }

    #[tokio::test]
    async fn recompute_publishes() {
        let p = panel();
        p.load(CSV);
        let sel = Selection::from_fields([FieldName::Password]);

        let status = p.recompute(&sel).await.unwrap();
        let latest = p.latest().unwrap();
        assert_eq!(status, RunStatus::Published(latest.generation));
        assert_eq!(latest.tree.as_ref().unwrap().leaf_count(), 2);
        assert_eq!(p.leaf_hashes().len(), 2);
    }

    #[tokio::test]
    async fn empty_selection_publishes_empty() {
        let p = panel();
        p.load(CSV);
        p.recompute(&Selection::new()).await.unwrap();
        let latest = p.latest().unwrap();
        assert!(latest.tree.is_none());
        assert_eq!(latest.empty_reason, Some(EmptyReason::NoSelection));
    }

    #[tokio::test]
    async fn reload_clears_result() {
        let p = panel();
        p.load(CSV);
        p.recompute(&Selection::from_fields([FieldName::Title])).await.unwrap();
        assert!(p.latest().is_some());

        p.load("Title\nother\n");
        assert!(p.latest().is_none());
    }

    #[tokio::test]
    async fn result_records_fields_actually_hashed() {
        let p = panel();
        p.load(CSV);
        p.recompute(&Selection::from_fields([FieldName::Title, FieldName::Username]))
            .await
            .unwrap();
        assert_eq!(
            p.latest().unwrap().selection,
            Selection::from_fields([FieldName::Title])
        );

        p.recompute(&Selection::from_fields([FieldName::Username])).await.unwrap();
        let latest = p.latest().unwrap();
        assert!(latest.selection.is_empty());
        assert_eq!(latest.empty_reason, Some(EmptyReason::NoSelection));
    }

    #[tokio::test]
    async fn newer_result_survives_older_retirement() {
        let p = panel();
        p.load(CSV);
        let loaded_at = p.generation();
        p.recompute(&Selection::from_fields([FieldName::Title])).await.unwrap();
        let published = p.latest().unwrap().generation;
        assert!(published > loaded_at);

        p.retire_results_before(loaded_at);
        assert_eq!(p.latest().unwrap().generation, published);

        p.retire_results_before(p.generation.advance().generation());
        assert!(p.latest().is_none());
    }

    #[tokio::test]
    async fn run_after_load_hashes_new_file() {
        let p = panel();
        p.load(CSV);
        let sel = Selection::from_fields([FieldName::Title]);
        p.recompute(&sel).await.unwrap();
        let before = p.latest().unwrap().root();

        p.load("Title\nother\n");
        p.recompute(&sel).await.unwrap();
        let latest = p.latest().unwrap();
        assert_ne!(latest.root(), before);
        assert_eq!(latest.root(), Some(Hash256::digest(b"other")));
    }

    #[tokio::test]
    async fn recompute_without_file() {
        let p = panel();
        p.recompute(&Selection::from_fields([FieldName::Title])).await.unwrap();
        assert_eq!(p.latest().unwrap().empty_reason, Some(EmptyReason::NoData));
    }
}
