use std::{collections::BTreeMap, fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use fabric_core::entitlement::StaticTierResolver;
use fabric_model::{ClusterConfig, NodeConfig, Task, Tier};
use fabric_observe::LoggerConfig;

/// Everything the daemon reads at start-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DaemonConfig {
    pub logger: LoggerConfig,
    pub cluster: ClusterConfig,
    pub node: NodeConfig,
    /// `host:port` of peers to handshake with after start.
    pub peers: Vec<String>,
    /// Caller id to tier; unknown callers get `defaultTier`.
    pub tiers: BTreeMap<String, Tier>,
    pub default_tier: Tier,
    /// Tasks processed right after start; empty runs the built-in demo batch.
    pub tasks: Vec<Task>,
    /// Stop after the start-up tasks instead of waiting for ctrl-c.
    pub exit_after_tasks: bool,
}

impl DaemonConfig {
    /// Read `path` as JSON, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.cluster.validate()?;
        Ok(cfg)
    }

    pub fn resolver(&self) -> StaticTierResolver {
        self.tiers.iter().fold(
            StaticTierResolver::new(self.default_tier.clone()),
            |r, (caller, tier)| r.with(caller.clone(), tier.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use fabric_model::TierRank;

    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg = DaemonConfig::parse("{}").unwrap();
        assert_eq!(cfg.cluster.regions.len(), 3);
        assert_eq!(cfg.node.port, 8765);
        assert!(cfg.tasks.is_empty());
        assert!(!cfg.exit_after_tasks);
        assert_eq!(cfg.default_tier, Tier::free());
    }

    #[test]
    fn sections_are_parsed() {
        let cfg = DaemonConfig::parse(
            r#"{
                "logger": {"format": "json"},
                "node": {"nodeId": "n7", "port": 9100},
                "cluster": {"latencyThresholdMs": 120},
                "peers": ["10.0.0.2:8765"],
                "tiers": {"alice": {"label": "one_percent", "rank": "premium"}},
                "tasks": [{"id": "t1", "origin": "alice", "prompt": "hi", "priority": "critical"}],
                "exitAfterTasks": true
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.node.address(), "127.0.0.1:9100");
        assert_eq!(cfg.cluster.latency_threshold_ms, 120.0);
        assert_eq!(cfg.peers, vec!["10.0.0.2:8765".to_string()]);
        assert_eq!(cfg.tasks[0].slots, 512);
        assert!(cfg.exit_after_tasks);
        let resolver = cfg.resolver();
        assert_eq!(resolver.lookup("alice").rank, TierRank::Premium);
        assert_eq!(resolver.lookup("bob"), &Tier::free());
    }

    #[test]
    fn invalid_cluster_is_rejected() {
        let err = DaemonConfig::parse(r#"{"cluster": {"defaultRegion": "mars"}}"#).unwrap_err();
        assert!(err.to_string().contains("mars"), "{err}");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = DaemonConfig::load(Some(Path::new("/nonexistent/fabric.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/fabric.json"));
    }
}
