use serde::{Deserialize, Serialize};

/// Exponential backoff between retry attempts (peer handshakes).
///
/// Attempt `n` (0-based) waits `min(max_ms, first_ms * factor^n)` before jitter is applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackoffStrategy {
    pub jitter: super::JitterStrategy,
    pub first_ms: u64,
    pub max_ms: u64,
    pub factor: f64,
}

impl BackoffStrategy {
    /// Un-jittered delay before retry number `attempt` (0-based), in milliseconds.
    pub fn base_delay_ms(&self, attempt: u32) -> u64 {
        let factor = if self.factor.is_finite() && self.factor >= 1.0 {
            self.factor
        } else {
            1.0
        };
        let raw = self.first_ms as f64 * factor.powi(attempt as i32);
        if !raw.is_finite() || raw >= self.max_ms as f64 {
            self.max_ms
        } else {
            raw as u64
        }
    }
}

impl Default for BackoffStrategy {
    /// One second doubling up to five seconds with equal jitter.
    fn default() -> Self {
        Self {
            jitter: super::JitterStrategy::Equal,
            first_ms: 1_000,
            max_ms: 5_000,
            factor: 2.0,
        }
    }
}
