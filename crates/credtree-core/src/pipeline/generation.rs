//! Generation counter for cooperative cancellation
//!
//! Starting a run advances the counter and captures the new value. After
//! each suspension point the run compares its captured value with the
//! current one; a mismatch means a newer run has started and this one must
//! stop without publishing anything.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Monotonic counter owned by one panel
#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new run, superseding any run in flight.
    pub fn advance(&self) -> RunToken<'_> {
        let generation = Generation(self.current.fetch_add(1, Ordering::AcqRel) + 1);
        RunToken {
            counter: self,
            generation,
        }
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::Acquire))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}

/// Captured generation of a run, checked after every suspension point
#[derive(Debug, Clone, Copy)]
pub struct RunToken<'a> {
    counter: &'a GenerationCounter,
    generation: Generation,
}

impl RunToken<'_> {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_stale(&self) -> bool {
        !self.counter.is_current(self.generation)
    }
}
