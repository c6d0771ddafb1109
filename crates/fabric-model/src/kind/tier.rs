use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{ModelError, ModelResult};

/// Ordered entitlement rank of a caller.
#[derive(
    Default, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TierRank {
    #[default]
    Free,
    Standard,
    Premium,
    Elite,
}

impl FromStr for TierRank {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" | "" => Ok(TierRank::Free),
            "standard" => Ok(TierRank::Standard),
            "premium" => Ok(TierRank::Premium),
            "elite" => Ok(TierRank::Elite),
            other => Err(ModelError::UnknownTierRank(other.to_string())),
        }
    }
}

/// Caller tier as resolved by the external entitlement service.
///
/// The label is opaque to the core (e.g. `"one_percent"`, `"pro"`); only the VIP label set
/// and the rank are interpreted by the scheduler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub label: String,
    pub rank: TierRank,
}

impl Tier {
    pub fn new(label: impl Into<String>, rank: TierRank) -> Self {
        Self {
            label: label.into(),
            rank,
        }
    }

    /// Unentitled caller.
    pub fn free() -> Self {
        Self::new("free", TierRank::Free)
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::free()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.label, self.rank)
    }
}
