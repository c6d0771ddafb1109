mod domain;
pub use domain::{
    DEFAULT_ADMISSION_THRESHOLD, DEFAULT_LATENCY_THRESHOLD_MS, ELITE_SCORE_THRESHOLD,
    MAX_ELITE_FRACTION, NON_VIP_REQUEST_FRACTION, RELIABILITY_CEILING_PCT, RELIABILITY_FLOOR_PCT,
    RELIABILITY_START_PCT,
};
pub use domain::{
    GeoPoint, PEER_PROTOCOL_VERSION, PeerAck, PeerHello, PeerInfo, PeerStatus, RegionId, SlotCount,
    TaskId,
};

mod error;
pub use error::{ModelError, ModelResult};

mod kind;
pub use kind::{PriorityClass, TaskState, Tier, TierRank};

mod spec;
pub use spec::{
    ClusterConfig, FulfillmentRequest, GenerationRequest, NodeConfig, RegionSpec, Task,
    TaskMetadata,
};

mod strategy;
pub use strategy::{BackoffStrategy, JitterStrategy};

mod report;
pub use report::{
    AllocationResult, ClusterSnapshot, ConnectReport, Migration, MigrationReason, NetworkStats,
    NodeStatus, PeerConnectStatus, ProcessOutcome, ProcessResponse, RarityScore, RegionReport,
    Rejection, ScoringStats, TaskOutput,
};
