use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{RegionId, SlotCount};

/// Health of one region at snapshot time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionReport {
    pub name: String,
    pub active: bool,
    pub total: SlotCount,
    pub available: SlotCount,
    pub used: SlotCount,
    pub elite_reserved: SlotCount,
    pub elite_used: SlotCount,
    pub tasks_served: u64,
    pub reliability: f64,
    /// Hours since the region last granted or released slots.
    pub idle_hours: f64,
}

/// Cluster-wide view produced by `sync`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
    /// Unix timestamp (ms).
    pub timestamp_ms: u64,
    pub reliability_target: f64,
    /// Mean reliability over all reported regions; 0 when there are none.
    pub average_reliability: f64,
    pub total_capacity: SlotCount,
    pub total_used: SlotCount,
    pub regions: BTreeMap<RegionId, RegionReport>,
    pub vip_tiers: Vec<String>,
}

impl ClusterSnapshot {
    pub fn total_available(&self) -> SlotCount {
        self.total_capacity.saturating_sub(self.total_used)
    }

    /// Share of capacity in use, in `[0, 1]`.
    pub fn utilization(&self) -> f64 {
        if self.total_capacity == 0 {
            0.0
        } else {
            self.total_used as f64 / self.total_capacity as f64
        }
    }

    pub fn active_regions(&self) -> usize {
        self.regions.values().filter(|r| r.active).count()
    }
}
