use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{RegionId, SlotCount, TaskId};

/// Bounded rarity score together with the admission decision it produced.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityScore {
    /// Score in `[0, 100]`.
    pub value: f64,
    /// Threshold the score was compared against.
    pub threshold: f64,
    /// `value > threshold`.
    pub admitted: bool,
}

impl RarityScore {
    pub fn evaluate(value: f64, threshold: f64) -> Self {
        Self {
            value,
            threshold,
            admitted: value > threshold,
        }
    }
}

/// Why an allocation left its first-choice region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MigrationReason {
    /// First choice could not grant the requested slots.
    Capacity,
    /// First choice was estimated above the latency threshold.
    Latency,
}

impl MigrationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationReason::Capacity => "capacity",
            MigrationReason::Latency => "latency",
        }
    }
}

impl fmt::Display for MigrationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single move of a task from one region to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Migration {
    pub from: RegionId,
    pub to: RegionId,
    pub reason: MigrationReason,
}

/// Outcome of a successful region allocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub task_id: TaskId,
    pub region_id: RegionId,
    pub region_name: String,
    /// Slots the task asked for.
    pub requested: SlotCount,
    /// Request after the non-VIP cap was applied.
    pub effective_request: SlotCount,
    /// Slots granted (general + elite), never above `requested`.
    pub granted: SlotCount,
    /// Part of `granted` drawn from the elite reserve.
    pub elite_granted: SlotCount,
    pub latency_ms: f64,
    pub vip: bool,
    pub elite_eligible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration: Option<Migration>,
    /// Region reliability at allocation time.
    pub reliability: f64,
}

impl AllocationResult {
    /// Whether fewer slots were granted than requested.
    pub fn is_partial(&self) -> bool {
        self.granted < self.requested
    }

    pub fn migrated(&self) -> bool {
        self.migration.is_some()
    }
}
