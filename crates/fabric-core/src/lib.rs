pub mod context;
pub mod entitlement;
pub mod entropy;
pub mod error;
pub mod metrics;
pub mod node;
pub mod peers;
pub mod ports;
pub mod region;
pub mod retry;
pub mod scheduler;
pub mod scoring;
pub mod state;

mod clock;
pub use clock::now_unix_ms;

pub use metrics::{GenerationOutcome, MetricsBackend, MetricsHandle, NoOpMetrics};

pub mod prelude {
    pub use crate::context::ClusterContext;
    pub use crate::entitlement::StaticTierResolver;
    pub use crate::entropy::{Entropy, EntropyHandle, ScriptedEntropy, SeededEntropy, ThreadEntropy};
    pub use crate::error::{CollaboratorError, CoreError, CoreResult};
    pub use crate::node::NodeRuntime;
    pub use crate::peers::PeerRegistry;
    pub use crate::ports::{Executor, Fulfillment, Generator, PeerConnector, TierResolver, Work};
    pub use crate::region::{RegionPool, SlotGrant};
    pub use crate::scheduler::ClusterScheduler;
    pub use crate::scoring::{ScoringPolicy, is_admitted};
}
