use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{ModelError, ModelResult};

/// Priority class declared by the caller for a task.
///
/// Classes are ordered; a higher class contributes a larger fixed term to the rarity score.
///
/// Classes:
/// - `Low`: background work, weight `0.4`.
/// - `Medium`: default class, weight `0.6`.
/// - `High`: interactive or paid work, weight `0.8`.
/// - `Critical`: must-run work, weight `1.0`.
#[derive(
    Default, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PriorityClass {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl PriorityClass {
    /// Multiplier applied to the priority term of the score.
    #[inline]
    pub fn weight(&self) -> f64 {
        match self {
            PriorityClass::Low => 0.4,
            PriorityClass::Medium => 0.6,
            PriorityClass::High => 0.8,
            PriorityClass::Critical => 1.0,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityClass::Low => "low",
            PriorityClass::Medium => "medium",
            PriorityClass::High => "high",
            PriorityClass::Critical => "critical",
        }
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityClass {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(PriorityClass::Low),
            "medium" | "normal" | "" => Ok(PriorityClass::Medium),
            "high" => Ok(PriorityClass::High),
            "critical" => Ok(PriorityClass::Critical),
            other => Err(ModelError::UnknownPriority(other.to_string())),
        }
    }
}
