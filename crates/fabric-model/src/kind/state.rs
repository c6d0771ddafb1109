use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};

/// Lifecycle of a single task inside a node.
///
/// ```text
/// Created -> Scored -> Rejected
///                   -> Admitted -> Allocating -> Allocated -> Executing -> Completed
///                                             -> CapacityFailed
/// ```
///
/// Nodes without a scheduler go straight from `Admitted` to `Executing`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskState {
    Created,
    Scored,
    Rejected,
    Admitted,
    Allocating,
    Allocated,
    Executing,
    Completed,
    CapacityFailed,
}

impl TaskState {
    /// Terminal states accept no further transitions.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Rejected | TaskState::Completed | TaskState::CapacityFailed
        )
    }

    /// Returns `true` if `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Created, Scored)
                | (Scored, Rejected)
                | (Scored, Admitted)
                | (Admitted, Allocating)
                | (Admitted, Executing)
                | (Allocating, Allocated)
                | (Allocating, CapacityFailed)
                | (Allocated, Executing)
                | (Executing, Completed)
        )
    }

    /// Validate and return `next`.
    pub fn transition(self, next: TaskState) -> ModelResult<TaskState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ModelError::IllegalTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Created => "created",
            TaskState::Scored => "scored",
            TaskState::Rejected => "rejected",
            TaskState::Admitted => "admitted",
            TaskState::Allocating => "allocating",
            TaskState::Allocated => "allocated",
            TaskState::Executing => "executing",
            TaskState::Completed => "completed",
            TaskState::CapacityFailed => "capacity_failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
