use fabric_model::MigrationReason;

use crate::metrics::backend::{GenerationOutcome, MetricsBackend};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_admission(&self, _: bool, _: f64) {}

    #[inline(always)]
    fn record_allocation(&self, _: &str, _: u64, _: u64) {}

    #[inline(always)]
    fn record_migration(&self, _: &str, _: &str, _: MigrationReason) {}

    #[inline(always)]
    fn record_capacity_failure(&self, _: &str) {}

    #[inline(always)]
    fn record_generation(&self, _: GenerationOutcome, _: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_metrics_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpMetrics>(), 0);
    }

    #[test]
    fn noop_can_be_called_repeatedly() {
        let metrics = NoOpMetrics;
        for _ in 0..1000 {
            metrics.record_admission(true, 97.0);
            metrics.record_allocation("us", 10, 1);
            metrics.record_migration("us", "eu", MigrationReason::Capacity);
            metrics.record_capacity_failure("us");
            metrics.record_generation(GenerationOutcome::Success, 100);
        }
    }
}
