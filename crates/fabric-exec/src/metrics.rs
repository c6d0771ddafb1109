//! Metrics helpers for executors.

use fabric_core::{GenerationOutcome, error::CollaboratorError};

/// Pooled executor type identifier for metrics and logs.
pub const EXECUTOR_TYPE_POOLED: &str = "pooled";

/// Inline executor type identifier for metrics and logs.
pub const EXECUTOR_TYPE_INLINE: &str = "inline";

/// Convert a collaborator error into a generation outcome for metrics.
pub fn collaborator_error_to_outcome(error: &CollaboratorError) -> GenerationOutcome {
    match error {
        CollaboratorError::Timeout { .. } => GenerationOutcome::Timeout,
        CollaboratorError::Panicked(_) => GenerationOutcome::Panicked,
        _ => GenerationOutcome::Failure,
    }
}
