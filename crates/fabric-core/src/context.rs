use std::fmt;

use crate::{
    entropy::{EntropyHandle, thread_entropy},
    metrics::{MetricsHandle, noop_metrics},
};

/// Shared handles passed to the scheduler and every node.
///
/// Built once at process start; cloning is cheap.
#[derive(Clone)]
pub struct ClusterContext {
    metrics: MetricsHandle,
    entropy: EntropyHandle,
}

impl ClusterContext {
    /// Create a new context with the given handles.
    pub fn new(metrics: MetricsHandle, entropy: EntropyHandle) -> Self {
        Self { metrics, entropy }
    }

    /// Get a clonable handle to the metrics backend.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    /// Get a clonable handle to the entropy source.
    pub fn entropy(&self) -> &EntropyHandle {
        &self.entropy
    }

    /// Replace the metrics backend and return updated context.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the entropy source and return updated context.
    pub fn with_entropy(mut self, entropy: EntropyHandle) -> Self {
        self.entropy = entropy;
        self
    }
}

impl Default for ClusterContext {
    fn default() -> Self {
        Self {
            metrics: noop_metrics(),
            entropy: thread_entropy(),
        }
    }
}

impl fmt::Debug for ClusterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterContext")
            .field("metrics", &"<handle>")
            .field("entropy", &"<handle>")
            .finish()
    }
}
