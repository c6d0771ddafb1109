mod constants;
pub use constants::{
    DEFAULT_ADMISSION_THRESHOLD, DEFAULT_LATENCY_THRESHOLD_MS, ELITE_SCORE_THRESHOLD,
    MAX_ELITE_FRACTION, NON_VIP_REQUEST_FRACTION, RELIABILITY_CEILING_PCT, RELIABILITY_FLOOR_PCT,
    RELIABILITY_START_PCT,
};

mod geo;
pub use geo::GeoPoint;

mod id;
pub use id::TaskId;

mod peer;
pub use peer::{PEER_PROTOCOL_VERSION, PeerAck, PeerHello, PeerInfo, PeerStatus};

/// Identifier of a deployed region (e.g. `"us"`, `"eu"`).
///
/// Region ids are short operator-chosen keys; they are stable for the lifetime of the process.
pub type RegionId = String;

/// Number of abstract capacity units ("slots").
pub type SlotCount = u64;
