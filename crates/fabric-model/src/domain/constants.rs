//! Common model-level constants.
//!
//! Reference values for admission, elite quota and region health.
//! Config structs default to these; keeping them here avoids scattering magic numbers.

/// Rarity score a task must exceed to be admitted by a node.
pub const DEFAULT_ADMISSION_THRESHOLD: f64 = 90.0;

/// Minimum rarity score for a VIP caller to draw from the elite reserve.
pub const ELITE_SCORE_THRESHOLD: f64 = 95.0;

/// Upper bound for the elite reserve of any region, as a fraction of its total capacity.
pub const MAX_ELITE_FRACTION: f64 = 0.01;

/// Per-request cap for non-VIP callers, as a fraction of total active cluster capacity.
pub const NON_VIP_REQUEST_FRACTION: f64 = 0.002;

/// Estimated latency (ms) above which a region is considered too far for the caller.
pub const DEFAULT_LATENCY_THRESHOLD_MS: f64 = 140.0;

/// Lower clamp of the rolling reliability percentage.
pub const RELIABILITY_FLOOR_PCT: f64 = 98.5;

/// Upper clamp of the rolling reliability percentage.
pub const RELIABILITY_CEILING_PCT: f64 = 100.0;

/// Reliability a freshly deployed region starts with.
pub const RELIABILITY_START_PCT: f64 = 99.2;
