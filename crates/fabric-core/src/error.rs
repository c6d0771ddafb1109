use thiserror::Error;

use fabric_model::{ModelError, RegionId, SlotCount, TaskId};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("region already deployed: {0}")]
    DuplicateRegion(RegionId),

    #[error("unknown region: {0}")]
    UnknownRegion(RegionId),

    #[error("no active region available")]
    NoActiveRegion,

    #[error("capacity exhausted for task {task_id}: region {region} granted 0 of {requested} slots")]
    CapacityExhausted {
        task_id: TaskId,
        region: RegionId,
        requested: SlotCount,
    },

    #[error("model error: {0}")]
    Model(#[from] ModelError),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Failure of an external collaborator (generator, fulfillment, resolver, peer).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator failed: {0}")]
    Failed(String),

    #[error("collaborator timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("collaborator panicked: {0}")]
    Panicked(String),

    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}
