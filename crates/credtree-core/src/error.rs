//! Pipeline error types
//!
//! Parsing and normalization never fail: malformed input degrades to empty
//! values. Only the digest primitive can abort a run.

use thiserror::Error;

/// Failure of the underlying digest primitive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The primitive is not available in this environment
    #[error("digest primitive unavailable: {0}")]
    Unavailable(String),

    /// The primitive returned an error while hashing
    #[error("digest failed: {0}")]
    Failed(String),
}

/// Terminal failure of a single pipeline run
///
/// Previously published results are left untouched when a run fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The digest primitive failed while hashing a row
    #[error("row hashing failed at row {row}: {source}")]
    Digest {
        row: usize,
        #[source]
        source: DigestError,
    },
}

/// Result type for pipeline runs
pub type PipelineResult<T> = Result<T, PipelineError>;
