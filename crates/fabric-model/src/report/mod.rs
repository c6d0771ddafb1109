mod allocation;
pub use allocation::{AllocationResult, Migration, MigrationReason, RarityScore};

mod snapshot;
pub use snapshot::{ClusterSnapshot, RegionReport};

mod response;
pub use response::{ProcessOutcome, ProcessResponse, Rejection, TaskOutput};

mod status;
pub use status::{ConnectReport, NetworkStats, NodeStatus, PeerConnectStatus, ScoringStats};
