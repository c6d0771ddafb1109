use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    domain::TaskId,
    report::{AllocationResult, RarityScore},
};

/// Why a task was turned away before any work started.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Rejection {
    /// Score did not exceed the admission threshold.
    Rarity { score: f64, threshold: f64 },
    /// The node is not running.
    NodeStopped,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Rarity { score, threshold } => {
                write!(f, "rarity score {score:.2} does not exceed {threshold:.2}")
            }
            Rejection::NodeStopped => f.write_str("node is not running"),
        }
    }
}

/// Result of the generator for an admitted task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TaskOutput {
    Generated { text: String },
    Failed { reason: String },
}

impl TaskOutput {
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskOutput::Failed { .. })
    }
}

impl fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutput::Generated { text } => f.write_str(text),
            TaskOutput::Failed { reason } => write!(f, "[ERROR] {reason}"),
        }
    }
}

/// Terminal outcome of `process`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ProcessOutcome {
    Rejected {
        reason: Rejection,
    },
    CapacityFailed {
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    Completed {
        /// Absent when the node runs without a scheduler.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        allocation: Option<AllocationResult>,
        output: TaskOutput,
        /// Delivery reference returned by the fulfillment collaborator.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delivery: Option<String>,
    },
}

impl ProcessOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessOutcome::Rejected { .. } => "rejected",
            ProcessOutcome::CapacityFailed { .. } => "capacity_failed",
            ProcessOutcome::Completed { .. } => "completed",
        }
    }
}

/// Everything the caller learns about one processed task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub task_id: TaskId,
    pub score: RarityScore,
    /// Resolved caller tier label; empty when the task never reached tier resolution.
    pub tier: String,
    pub elapsed_ms: u64,
    pub outcome: ProcessOutcome,
}

impl ProcessResponse {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, ProcessOutcome::Completed { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome, ProcessOutcome::Rejected { .. })
    }

    pub fn allocation(&self) -> Option<&AllocationResult> {
        match &self.outcome {
            ProcessOutcome::Completed { allocation, .. } => allocation.as_ref(),
            _ => None,
        }
    }

    pub fn output(&self) -> Option<&TaskOutput> {
        match &self.outcome {
            ProcessOutcome::Completed { output, .. } => Some(output),
            _ => None,
        }
    }
}
