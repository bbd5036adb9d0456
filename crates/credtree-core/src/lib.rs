//! credtree Core Engine
//!
//! Turns tabular credential exports into a content-addressed Merkle tree so
//! two exports can be compared by root hash without revealing their values.
//!
//! The pipeline runs strictly forward:
//!
//! 1. [`csv`] - tokenizes raw text into a header row and row mappings
//! 2. [`normalize`] - binds configured fields to headers and canonicalizes values
//! 3. [`sync::content`] - derives an identity hash and a sort hash per row
//! 4. [`sync::merkle`] - orders leaves and builds a double-SHA-256 binary tree
//! 5. [`sync::diff_leaves`] - flags candidate leaves missing from a reference set
//!
//! [`pipeline`] drives steps 2-4 asynchronously with generation-based
//! cancellation, one [`Panel`] per loaded export.
//!
//! # Example
//!
//! ```rust
//! use credtree_core::csv;
//! use credtree_core::normalize::{bind_headers, FieldName, FieldSpec, Selection};
//! use credtree_core::pipeline::build_tree_sync;
//!
//! let table = csv::parse("Title,Password\nmail,hunter2\nbank,letmein\n");
//! let bindings = bind_headers(&FieldSpec::defaults(), &table.headers);
//! let selection = Selection::from_fields([FieldName::Password]);
//!
//! let tree = build_tree_sync(&table, &bindings, &selection).unwrap();
//! assert_eq!(tree.leaf_count(), 2);
//! assert_eq!(tree.root().to_string().len(), 64);
//! ```

pub mod csv;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod sync;

pub use csv::CsvTable;
pub use error::{DigestError, PipelineError};
pub use normalize::{FieldName, FieldSpec, HeaderBinding, NormalizedRow, Selection};
pub use pipeline::{Computation, Dataset, Digester, LoadStatus, Panel, RunStatus, Sha256Digester};
pub use sync::{compare_trees, diff_leaves, diff_trees, Comparison, Hash256, MerkleTree, TreeNode};
