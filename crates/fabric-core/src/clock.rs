use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as unix milliseconds; 0 if the clock is before the epoch.
pub fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
