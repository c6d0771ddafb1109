mod geo;
pub use geo::{LatencyModel, haversine_km};

mod pool;
pub use pool::{RegionPool, SlotGrant};
