//! Injectable randomness.
//!
//! Every random decision in the core (reliability drift, score jitter, retry jitter) goes
//! through [`Entropy`] so tests can pin exact sequences.
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Source of uniform random numbers.
pub trait Entropy: Send + Sync + 'static {
    /// Uniform sample in `[0, 1)`.
    fn unit(&self) -> f64;

    /// Uniform sample in `[low, high)`; returns `low` for an empty range.
    fn uniform(&self, low: f64, high: f64) -> f64 {
        if !(high > low) {
            return low;
        }
        low + self.unit() * (high - low)
    }
}

/// Shared handle to an entropy source.
pub type EntropyHandle = Arc<dyn Entropy>;

/// Production entropy backed by the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadEntropy;

impl Entropy for ThreadEntropy {
    fn unit(&self) -> f64 {
        rand::thread_rng().r#gen::<f64>()
    }
}

/// Reproducible entropy from a fixed seed.
#[derive(Debug)]
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Entropy for SeededEntropy {
    fn unit(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .r#gen::<f64>()
    }
}

/// Entropy replaying a fixed cycle of unit samples.
///
/// Values are clamped into `[0, 1)`. An empty script always yields `0.5`, the midpoint.
#[derive(Debug)]
pub struct ScriptedEntropy {
    values: Vec<f64>,
    cursor: AtomicUsize,
}

impl ScriptedEntropy {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Always the midpoint: `uniform(a, b)` returns `(a + b) / 2`.
    pub fn midpoint() -> Self {
        Self::new(Vec::new())
    }
}

impl Entropy for ScriptedEntropy {
    fn unit(&self) -> f64 {
        if self.values.is_empty() {
            return 0.5;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[i].clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Create a handle to [`ThreadEntropy`].
#[inline]
pub fn thread_entropy() -> EntropyHandle {
    Arc::new(ThreadEntropy)
}
