mod task;
pub use task::{FulfillmentRequest, GenerationRequest, Task, TaskMetadata};

mod region;
pub use region::RegionSpec;

mod config;
pub use config::{ClusterConfig, NodeConfig};
