use fabric_model::{DEFAULT_LATENCY_THRESHOLD_MS, GeoPoint};

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6_371.0088;

/// Great-circle distance between two points (haversine formula).
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Distance-derived latency estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct LatencyModel {
    /// Estimate used when the caller location is unknown.
    pub unknown_ms: f64,
    pub ms_per_km: f64,
    pub floor_ms: f64,
    pub ceiling_ms: f64,
    /// Estimates strictly above this are "high latency".
    pub threshold_ms: f64,
}

impl LatencyModel {
    pub fn with_threshold(mut self, threshold_ms: f64) -> Self {
        self.threshold_ms = threshold_ms;
        self
    }

    pub fn estimate_ms(&self, region: GeoPoint, caller: Option<GeoPoint>) -> f64 {
        match caller {
            None => self.unknown_ms,
            Some(c) => (haversine_km(c, region) * self.ms_per_km).clamp(self.floor_ms, self.ceiling_ms),
        }
    }

    #[inline]
    pub fn is_high(&self, latency_ms: f64) -> bool {
        latency_ms > self.threshold_ms
    }
}

impl Default for LatencyModel {
    fn default() -> Self {
        Self {
            unknown_ms: 45.0,
            ms_per_km: 0.5,
            floor_ms: 25.0,
            ceiling_ms: 180.0,
            threshold_ms: DEFAULT_LATENCY_THRESHOLD_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SF: GeoPoint = GeoPoint::new(37.7749, -122.4194);
    const BERLIN: GeoPoint = GeoPoint::new(52.52, 13.405);

    #[test]
    fn haversine_matches_known_distance() {
        let d = haversine_km(SF, BERLIN);
        assert!((d - 9_100.0).abs() < 60.0, "unexpected SF-Berlin distance: {d}");
        assert!(haversine_km(SF, SF).abs() < 1e-9);
    }

    #[test]
    fn latency_is_clamped() {
        let m = LatencyModel::default();
        assert_eq!(m.estimate_ms(SF, None), 45.0);
        assert_eq!(m.estimate_ms(SF, Some(SF)), 25.0);
        assert_eq!(m.estimate_ms(SF, Some(BERLIN)), 180.0);
        assert!(m.is_high(180.0));
        assert!(!m.is_high(140.0));
    }
}
