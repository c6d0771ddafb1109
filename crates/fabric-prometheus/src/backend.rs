use std::sync::Arc;

use prometheus::{
    CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use fabric_core::{GenerationOutcome, MetricsBackend};
use fabric_model::MigrationReason;

const NAMESPACE: &str = "fabric";

/// Prometheus implementation of [`MetricsBackend`].
///
/// Label values are bounded: region ids come from configuration, `decision`, `pool`,
/// `reason` and `outcome` are fixed sets.
#[derive(Clone)]
pub struct PrometheusMetrics {
    admissions: CounterVec,
    scores: Histogram,
    allocations: CounterVec,
    slots_granted: CounterVec,
    migrations: CounterVec,
    capacity_failures: CounterVec,
    generations: CounterVec,
    generation_duration: Histogram,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register every metric in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let admissions = counter(
            &registry,
            "admissions_total",
            "Admission decisions by outcome",
            &["decision"],
        )?;
        let scores = Histogram::with_opts(
            HistogramOpts::new("rarity_score", "Computed rarity scores")
                .namespace(NAMESPACE)
                .buckets(vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 95.0, 100.0]),
        )?;
        registry.register(Box::new(scores.clone()))?;

        let allocations = counter(
            &registry,
            "allocations_total",
            "Allocations with a non-zero grant",
            &["region"],
        )?;
        let slots_granted = counter(
            &registry,
            "slots_granted_total",
            "Slots granted by region and pool",
            &["region", "pool"],
        )?;
        let migrations = counter(
            &registry,
            "migrations_total",
            "Requests moved away from their first-choice region",
            &["from", "to", "reason"],
        )?;
        let capacity_failures = counter(
            &registry,
            "capacity_failures_total",
            "Allocations that ended with a zero grant",
            &["region"],
        )?;
        let generations = counter(
            &registry,
            "generations_total",
            "Generator runs by outcome",
            &["outcome"],
        )?;
        let generation_duration = Histogram::with_opts(
            HistogramOpts::new("generation_duration_seconds", "Generator run duration in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
        )?;
        registry.register(Box::new(generation_duration.clone()))?;

        Ok(Self {
            admissions,
            scores,
            allocations,
            slots_granted,
            migrations,
            capacity_failures,
            generations,
            generation_duration,
            registry,
        })
    }

    /// Backend with its own registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render every family in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

fn counter(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<CounterVec, prometheus::Error> {
    let c = CounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl MetricsBackend for PrometheusMetrics {
    fn record_admission(&self, admitted: bool, score: f64) {
        let decision = if admitted { "admitted" } else { "rejected" };
        self.admissions.with_label_values(&[decision]).inc();
        self.scores.observe(score);
    }

    fn record_allocation(&self, region: &str, granted: u64, elite: u64) {
        self.allocations.with_label_values(&[region]).inc();
        self.slots_granted
            .with_label_values(&[region, "general"])
            .inc_by(granted.saturating_sub(elite) as f64);
        self.slots_granted
            .with_label_values(&[region, "elite"])
            .inc_by(elite as f64);
    }

    fn record_migration(&self, from: &str, to: &str, reason: MigrationReason) {
        self.migrations
            .with_label_values(&[from, to, reason.as_str()])
            .inc();
    }

    fn record_capacity_failure(&self, region: &str) {
        self.capacity_failures.with_label_values(&[region]).inc();
    }

    fn record_generation(&self, outcome: GenerationOutcome, duration_ms: u64) {
        self.generations
            .with_label_values(&[outcome.as_label()])
            .inc();
        self.generation_duration.observe(duration_ms as f64 / 1000.0);
    }
}
