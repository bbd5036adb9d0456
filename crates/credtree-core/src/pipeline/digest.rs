//! Asynchronous digest primitive
//!
//! Every row hash goes through a [`Digester`], and each call is a suspension
//! point where a superseded run notices it is stale.

use std::future::Future;

use crate::error::DigestError;
use crate::sync::Hash256;

/// SHA-256 provider used by the pipeline
pub trait Digester {
    fn sha256(&self, data: &[u8]) -> impl Future<Output = Result<Hash256, DigestError>>;
}

/// In-process SHA-256 that yields to the scheduler before each digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digester;

impl Digester for Sha256Digester {
    async fn sha256(&self, data: &[u8]) -> Result<Hash256, DigestError> {
        tokio::task::yield_now().await;
        Ok(Hash256::digest(data))
    }
}

impl<D: Digester> Digester for &D {
    fn sha256(&self, data: &[u8]) -> impl Future<Output = Result<Hash256, DigestError>> {
        (**self).sha256(data)
    }
}
