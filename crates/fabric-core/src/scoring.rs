//! Rarity scoring and admission.
//!
//! A score is the sum of three capped terms:
//! - priority: `weight * priority_points` (24..=60 with the defaults),
//! - complexity: `complexity / 10 * complexity_points`, capped at `complexity_points`,
//! - payload: `payload_points * (1 - e^(-bytes / payload_scale))`.
//!
//! The result is clamped to `[0, 100]`.
use fabric_model::{DEFAULT_ADMISSION_THRESHOLD, RarityScore, TaskMetadata};

use crate::entropy::Entropy;

/// Plain admission comparison: strictly above the threshold.
#[inline]
pub fn is_admitted(score: f64, threshold: f64) -> bool {
    score > threshold
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoringPolicy {
    pub priority_points: f64,
    pub complexity_points: f64,
    pub payload_points: f64,
    /// Payload size (bytes) at which the payload term reaches ~63% of its cap.
    pub payload_scale: f64,
    pub threshold: f64,
    /// Amplitude of uniform noise added before the clamp; 0 keeps scoring deterministic.
    pub jitter: f64,
}

impl ScoringPolicy {
    pub const MIN_SCORE: f64 = 0.0;
    pub const MAX_SCORE: f64 = 100.0;

    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_finite() { jitter.abs() } else { 0.0 };
        self
    }

    /// Deterministic score before jitter and clamping.
    pub fn raw_score(&self, meta: &TaskMetadata) -> f64 {
        let priority = meta.priority_weight() * self.priority_points;
        let complexity =
            (meta.complexity / TaskMetadata::MAX_COMPLEXITY * self.complexity_points)
                .min(self.complexity_points)
                .max(0.0);
        let payload = if self.payload_scale > 0.0 {
            self.payload_points * (1.0 - (-(meta.payload_bytes as f64) / self.payload_scale).exp())
        } else {
            self.payload_points
        };
        priority + complexity + payload
    }

    /// Score `meta` against the policy threshold.
    ///
    /// `entropy` is only consulted when jitter is enabled.
    pub fn score(&self, meta: &TaskMetadata, entropy: &dyn Entropy) -> RarityScore {
        let mut value = self.raw_score(meta);
        if self.jitter > 0.0 {
            value += entropy.uniform(-self.jitter, self.jitter);
        }
        let value = if value.is_finite() {
            value.clamp(Self::MIN_SCORE, Self::MAX_SCORE)
        } else {
            Self::MIN_SCORE
        };
        RarityScore {
            value,
            threshold: self.threshold,
            admitted: is_admitted(value, self.threshold),
        }
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            priority_points: 60.0,
            complexity_points: 20.0,
            payload_points: 20.0,
            payload_scale: 10_000.0,
            threshold: DEFAULT_ADMISSION_THRESHOLD,
            jitter: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{ScriptedEntropy, SeededEntropy};
    use fabric_model::{PriorityClass, Task};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn meta(priority: PriorityClass, complexity: f64, payload: usize) -> TaskMetadata {
        Task::new("t", "caller", "")
            .with_priority(priority)
            .with_complexity(complexity)
            .with_payload("x".repeat(payload))
            .metadata(0)
    }

    #[test]
    fn minimum_inputs_are_rejected() {
        let policy = ScoringPolicy::default();
        let s = policy.score(&meta(PriorityClass::Low, 1.0, 0), &ScriptedEntropy::midpoint());
        assert!((s.value - 26.0).abs() < 1e-9, "expected 26, got {}", s.value);
        assert!(!s.admitted);
        assert_eq!(s.threshold, 90.0);
    }

    #[test]
    fn critical_complex_large_payload_is_admitted() {
        let policy = ScoringPolicy::default();
        let s = policy.score(
            &meta(PriorityClass::Critical, 10.0, 50_000),
            &ScriptedEntropy::midpoint(),
        );
        assert!(s.value > 99.0 && s.value <= 100.0, "got {}", s.value);
        assert!(s.admitted);
    }

    #[test]
    fn higher_priority_scores_higher() {
        let policy = ScoringPolicy::default();
        let e = ScriptedEntropy::midpoint();
        let mut last = f64::MIN;
        for p in [
            PriorityClass::Low,
            PriorityClass::Medium,
            PriorityClass::High,
            PriorityClass::Critical,
        ] {
            let v = policy.score(&meta(p, 5.0, 1_000), &e).value;
            assert!(v > last, "{p} did not increase the score");
            last = v;
        }
    }

    #[test]
    fn jitter_uses_injected_entropy_and_stays_clamped() {
        let policy = ScoringPolicy::default().with_jitter(5.0);
        let high = ScriptedEntropy::new(vec![0.999]);
        let s = policy.score(&meta(PriorityClass::Critical, 10.0, 1_000_000), &high);
        assert_eq!(s.value, 100.0);

        let low = ScriptedEntropy::new(vec![0.0]);
        let s = policy.score(&meta(PriorityClass::Low, 1.0, 0), &low);
        assert!((s.value - 21.0).abs() < 1e-9, "expected 21, got {}", s.value);
    }

    #[test]
    fn score_is_always_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let policy = ScoringPolicy::default().with_jitter(10.0);
        let entropy = SeededEntropy::new(11);
        let priorities = [
            PriorityClass::Low,
            PriorityClass::Medium,
            PriorityClass::High,
            PriorityClass::Critical,
        ];
        for _ in 0..2_000 {
            let mut m = meta(priorities[rng.gen_range(0..4)], 1.0, 0);
            m.complexity = rng.gen_range(-1_000.0..1_000.0);
            m.payload_bytes = rng.gen_range(0..u64::MAX / 2);
            let s = policy.score(&m, &entropy);
            assert!(
                (0.0..=100.0).contains(&s.value),
                "score out of bounds: {} for {m:?}",
                s.value
            );
        }
    }
}
