use serde::{Deserialize, Serialize};

/// Point-in-time status of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    pub node_id: String,
    pub address: String,
    pub running: bool,
    pub uptime_secs: u64,
    pub peers: usize,
    pub tasks_completed: u64,
    pub reputation: f64,
}

/// Running statistics over every score a node computed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringStats {
    pub tasks_scored: u64,
    pub admitted: u64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    /// Percentage of scored tasks that were admitted.
    pub admitted_pct: f64,
}

impl ScoringStats {
    pub fn record(&mut self, value: f64, admitted: bool) {
        if self.tasks_scored == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.tasks_scored += 1;
        if admitted {
            self.admitted += 1;
        }
        let n = self.tasks_scored as f64;
        self.avg += (value - self.avg) / n;
        self.admitted_pct = self.admitted as f64 / n * 100.0;
    }
}

/// Network-level view of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    /// This node plus its registered peers.
    pub nodes: usize,
    pub tasks_processed: u64,
    pub scoring: ScoringStats,
    pub uptime_secs: u64,
}

/// Per-address result of a connect attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerConnectStatus {
    pub address: String,
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of `connect_peers`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectReport {
    pub connected: usize,
    pub failed: usize,
    pub peers: Vec<PeerConnectStatus>,
}

impl ConnectReport {
    pub fn push(&mut self, status: PeerConnectStatus) {
        if status.connected {
            self.connected += 1;
        } else {
            self.failed += 1;
        }
        self.peers.push(status);
    }
}
