use std::sync::Arc;

use fabric_model::MigrationReason;

/// Generator outcome for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Text produced.
    Success,
    /// Generator returned an error.
    Failure,
    /// Generator exceeded its timeout.
    Timeout,
    /// Worker panicked while running the generator.
    Panicked,
}

impl GenerationOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            GenerationOutcome::Success => "success",
            GenerationOutcome::Failure => "failure",
            GenerationOutcome::Timeout => "timeout",
            GenerationOutcome::Panicked => "panicked",
        }
    }
}

/// Backend metrics collection interface.
///
/// Implementations are injected via [`crate::context::ClusterContext`] and shared by the
/// scheduler and every node.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record an admission decision.
    ///
    /// # Arguments
    /// - `admitted`: Whether the score exceeded the threshold
    /// - `score`: Rarity score in `[0, 100]`
    fn record_admission(&self, admitted: bool, score: f64);
    /// Record a successful allocation.
    ///
    /// # Arguments
    /// - `region`: Region that granted the slots
    /// - `granted`: Slots granted in total
    /// - `elite`: Part of `granted` drawn from the elite reserve
    fn record_allocation(&self, region: &str, granted: u64, elite: u64);
    /// Record a migration away from the first-choice region.
    fn record_migration(&self, from: &str, to: &str, reason: MigrationReason);
    /// Record an allocation that ended with a zero grant.
    fn record_capacity_failure(&self, region: &str);
    /// Record a generator run with outcome and duration.
    fn record_generation(&self, outcome: GenerationOutcome, duration_ms: u64);
}

/// Shared handle to metrics backend.
///
/// Stored in [`crate::context::ClusterContext`] and cloned into every component.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
