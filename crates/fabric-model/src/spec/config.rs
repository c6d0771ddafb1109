use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        DEFAULT_ADMISSION_THRESHOLD, DEFAULT_LATENCY_THRESHOLD_MS, ELITE_SCORE_THRESHOLD,
        GeoPoint, NON_VIP_REQUEST_FRACTION, RELIABILITY_START_PCT, RegionId, SlotCount,
    },
    error::{ModelError, ModelResult},
    kind::{Tier, TierRank},
    spec::RegionSpec,
    strategy::BackoffStrategy,
};

/// Cluster-wide scheduling configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfig {
    /// Regions deployed at start-up.
    pub regions: Vec<RegionSpec>,
    /// Tier labels treated as VIP regardless of rank.
    pub vip_tiers: Vec<String>,
    /// Any tier at or above this rank is VIP.
    pub vip_min_rank: TierRank,
    /// Score a VIP task must reach to draw on the elite reserve.
    pub elite_score_threshold: f64,
    /// Non-VIP per-request cap as a fraction of total active capacity.
    pub non_vip_request_fraction: f64,
    /// Estimated latency above which the scheduler looks for another region.
    pub latency_threshold_ms: f64,
    /// Region used when a task carries neither a region nor a location.
    pub default_region: Option<RegionId>,
    /// Advertised reliability target, reported in snapshots.
    pub reliability_target: f64,
    /// Number of snapshots retained by `sync`.
    pub history_limit: usize,
    /// Interval of the periodic sync loop.
    pub sync_interval_ms: u64,
}

impl ClusterConfig {
    /// Total capacity of the built-in three-region layout.
    pub const DEFAULT_TOTAL_SLOTS: SlotCount = 100_000;

    /// Three regions splitting [`Self::DEFAULT_TOTAL_SLOTS`] 40/35/25.
    pub fn default_regions() -> Vec<RegionSpec> {
        let total = Self::DEFAULT_TOTAL_SLOTS;
        let us = total * 40 / 100;
        let eu = total * 35 / 100;
        let apac = total - us - eu;
        vec![
            RegionSpec::new("us", GeoPoint::new(37.7749, -122.4194), us)
                .with_name("US-West (San Francisco)"),
            RegionSpec::new("eu", GeoPoint::new(52.52, 13.405), eu)
                .with_name("EU-Central (Berlin)"),
            RegionSpec::new("in", GeoPoint::new(13.0827, 80.2707), apac)
                .with_name("APAC-South (Chennai)"),
        ]
    }

    /// Whether `tier` gets VIP treatment.
    pub fn is_vip(&self, tier: &Tier) -> bool {
        tier.rank >= self.vip_min_rank || self.vip_tiers.iter().any(|t| t == &tier.label)
    }

    pub fn validate(&self) -> ModelResult<()> {
        for region in &self.regions {
            region.validate()?;
        }
        if !(0.0..=1.0).contains(&self.non_vip_request_fraction) {
            return Err(ModelError::Invalid(format!(
                "non-VIP request fraction {} outside [0, 1]",
                self.non_vip_request_fraction
            )));
        }
        if !self.latency_threshold_ms.is_finite() || self.latency_threshold_ms <= 0.0 {
            return Err(ModelError::Invalid(format!(
                "latency threshold must be positive, got {}",
                self.latency_threshold_ms
            )));
        }
        if let Some(id) = &self.default_region {
            if !self.regions.iter().any(|r| &r.id == id) {
                return Err(ModelError::Invalid(format!(
                    "default region {id} is not configured"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            regions: Self::default_regions(),
            vip_tiers: vec!["one_percent".into(), "rarest".into(), "rare".into()],
            vip_min_rank: TierRank::Elite,
            elite_score_threshold: ELITE_SCORE_THRESHOLD,
            non_vip_request_fraction: NON_VIP_REQUEST_FRACTION,
            latency_threshold_ms: DEFAULT_LATENCY_THRESHOLD_MS,
            default_region: None,
            reliability_target: RELIABILITY_START_PCT,
            history_limit: 256,
            sync_interval_ms: 10_000,
        }
    }
}

/// Per-node runtime configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeConfig {
    pub node_id: String,
    pub host: String,
    pub port: u16,
    /// Key advertised during peer handshakes.
    pub public_key: String,
    /// Protocol version advertised during peer handshakes.
    pub version: String,
    /// Score a task must exceed to be admitted.
    pub admission_threshold: f64,
    /// Amplitude of the uniform noise added to scores (0 disables it).
    pub score_jitter: f64,
    pub generator_timeout_ms: u64,
    pub resolver_timeout_ms: u64,
    pub fulfillment_timeout_ms: u64,
    pub peer_connect_timeout_ms: u64,
    /// Handshake attempts per peer address.
    pub peer_retry_attempts: u32,
    pub peer_backoff: BackoffStrategy,
    /// Worker pool size; `None` uses the available parallelism.
    pub workers: Option<usize>,
    /// Number of task lifecycles kept for inspection.
    pub task_book_limit: usize,
    /// Return allocated slots to their region once the task finished.
    pub release_on_completion: bool,
}

impl NodeConfig {
    /// `host:port` the node listens on.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: "node-local".into(),
            host: "127.0.0.1".into(),
            port: 8765,
            public_key: String::new(),
            version: "1.0".into(),
            admission_threshold: DEFAULT_ADMISSION_THRESHOLD,
            score_jitter: 0.0,
            generator_timeout_ms: 30_000,
            resolver_timeout_ms: 2_000,
            fulfillment_timeout_ms: 10_000,
            peer_connect_timeout_ms: 5_000,
            peer_retry_attempts: 3,
            peer_backoff: BackoffStrategy::default(),
            workers: None,
            task_book_limit: 1_024,
            release_on_completion: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_regions_cover_total() {
        let cfg = ClusterConfig::default();
        let sum: SlotCount = cfg.regions.iter().map(|r| r.total).sum();
        assert_eq!(sum, ClusterConfig::DEFAULT_TOTAL_SLOTS);
        assert_eq!(cfg.regions[0].total, 40_000);
        assert_eq!(cfg.regions[1].total, 35_000);
        assert_eq!(cfg.regions[2].total, 25_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn reliability_target_matches_region_start() {
        let cfg = ClusterConfig::default();
        assert_eq!(cfg.reliability_target, 99.2);
        assert_eq!(cfg.reliability_target, RELIABILITY_START_PCT);
    }

    #[test]
    fn vip_by_label_or_rank() {
        let cfg = ClusterConfig::default();
        assert!(cfg.is_vip(&Tier::new("rare", TierRank::Free)));
        assert!(cfg.is_vip(&Tier::new("whatever", TierRank::Elite)));
        assert!(!cfg.is_vip(&Tier::new("pro", TierRank::Premium)));
        assert!(!cfg.is_vip(&Tier::free()));
    }

    #[test]
    fn unknown_default_region_is_invalid() {
        let cfg = ClusterConfig {
            default_region: Some("mars".into()),
            ..ClusterConfig::default()
        };
        match cfg.validate() {
            Err(ModelError::Invalid(msg)) => assert!(msg.contains("mars")),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: NodeConfig = serde_json::from_str(r#"{"nodeId":"n1","port":9000}"#).unwrap();
        assert_eq!(cfg.node_id, "n1");
        assert_eq!(cfg.address(), "127.0.0.1:9000");
        assert_eq!(cfg.peer_retry_attempts, 3);
        assert_eq!(cfg.admission_threshold, DEFAULT_ADMISSION_THRESHOLD);

        let cluster: ClusterConfig = serde_json::from_str(r#"{"historyLimit":8}"#).unwrap();
        assert_eq!(cluster.history_limit, 8);
        assert_eq!(cluster.regions.len(), 3);
    }
}
