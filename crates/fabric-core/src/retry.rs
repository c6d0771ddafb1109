//! Retry with exponential backoff and jitter.
use std::{future::Future, time::Duration};

use fabric_model::{BackoffStrategy, JitterStrategy};
use tracing::debug;

use crate::entropy::Entropy;

/// Delay to wait before retry number `attempt` (0-based).
pub fn backoff_delay(strategy: &BackoffStrategy, attempt: u32, entropy: &dyn Entropy) -> Duration {
    let base = strategy.base_delay_ms(attempt) as f64;
    let ms = match strategy.jitter {
        JitterStrategy::None => base,
        JitterStrategy::Full => entropy.uniform(0.0, base),
        JitterStrategy::Equal => entropy.uniform(base / 2.0, base),
        JitterStrategy::Decorrelated => entropy
            .uniform(base, base * 3.0)
            .min(strategy.max_ms as f64),
    };
    Duration::from_millis(ms.max(0.0) as u64)
}

/// Outcome of [`retry`]: the last result and the number of attempts made.
#[derive(Debug)]
pub struct Retried<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Run `op` up to `attempts` times (at least once), sleeping between failures.
pub async fn retry<T, E, F, Fut>(
    attempts: u32,
    strategy: &BackoffStrategy,
    entropy: &dyn Entropy,
    mut op: F,
) -> Retried<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(v) => {
                return Retried {
                    result: Ok(v),
                    attempts: attempt + 1,
                };
            }
            Err(e) if attempt + 1 >= attempts => {
                return Retried {
                    result: Err(e),
                    attempts: attempt + 1,
                };
            }
            Err(e) => {
                let delay = backoff_delay(strategy, attempt, entropy);
                debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
