use serde::{Deserialize, Serialize};

use crate::{
    domain::{GeoPoint, MAX_ELITE_FRACTION, RegionId, SlotCount},
    error::{ModelError, ModelResult},
};

/// Deployment description of a single region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSpec {
    pub id: RegionId,
    /// Human readable name; defaults to the id.
    #[serde(default)]
    pub name: String,
    pub location: GeoPoint,
    /// Total slot capacity.
    pub total: SlotCount,
    /// Share of `total` reserved for elite callers, within `[0, 0.01]`.
    #[serde(default = "default_elite_fraction")]
    pub elite_fraction: f64,
}

fn default_elite_fraction() -> f64 {
    MAX_ELITE_FRACTION
}

impl RegionSpec {
    pub fn new(id: impl Into<RegionId>, location: GeoPoint, total: SlotCount) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            location,
            total,
            elite_fraction: MAX_ELITE_FRACTION,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_elite_fraction(mut self, fraction: f64) -> Self {
        self.elite_fraction = fraction;
        self
    }

    /// Name to display; falls back to the id when no name was configured.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Slots held back for elite callers: `floor(total * elite_fraction)`.
    pub fn reserved_elite(&self) -> SlotCount {
        (self.total as f64 * self.elite_fraction).floor() as SlotCount
    }

    /// Validate before a pool is built from this region.
    pub fn validate(&self) -> ModelResult<()> {
        if self.id.trim().is_empty() {
            return Err(ModelError::Invalid("region id must not be empty".into()));
        }
        if self.total == 0 {
            return Err(ModelError::Invalid(format!(
                "region {}: total capacity must be positive",
                self.id
            )));
        }
        if !self.elite_fraction.is_finite()
            || !(0.0..=MAX_ELITE_FRACTION).contains(&self.elite_fraction)
        {
            return Err(ModelError::Invalid(format!(
                "region {}: elite fraction {} outside [0, {}]",
                self.id, self.elite_fraction, MAX_ELITE_FRACTION
            )));
        }
        self.location.validate()
    }
}
