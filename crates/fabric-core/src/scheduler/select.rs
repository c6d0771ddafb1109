//! Region selection helpers used by `allocate`.
use std::{cmp::Ordering, sync::Arc};

use fabric_model::{GeoPoint, MigrationReason, SlotCount};

use crate::region::{LatencyModel, RegionPool, haversine_km};

/// First-choice region for a request.
///
/// Preference order: the requested region when it is among `pools`, the nearest region to
/// `location`, the default region, the first region. `pools` must be non-empty and hold
/// active regions in deployment order.
pub(crate) fn first_choice<'a>(
    pools: &'a [Arc<RegionPool>],
    preferred: Option<&str>,
    default_region: Option<&str>,
    location: Option<GeoPoint>,
) -> Option<&'a Arc<RegionPool>> {
    if let Some(id) = preferred {
        if let Some(pool) = pools.iter().find(|p| p.id() == id) {
            return Some(pool);
        }
    }
    if let Some(loc) = location {
        return pools.iter().min_by(|a, b| {
            haversine_km(loc, a.location())
                .partial_cmp(&haversine_km(loc, b.location()))
                .unwrap_or(Ordering::Equal)
        });
    }
    default_region
        .and_then(|id| pools.iter().find(|p| p.id() == id))
        .or_else(|| pools.first())
}

/// Inputs describing the region the request is moving away from.
pub(crate) struct Departure<'a> {
    pub pool: &'a RegionPool,
    pub reason: MigrationReason,
    pub latency_ms: f64,
    pub available: SlotCount,
}

/// Best alternative to `from`, or `None` when no other region improves on it.
///
/// Candidates must have free capacity for the caller. A capacity move needs more free slots
/// than the departure region; a latency move needs a strictly lower estimate. Among
/// candidates, regions fitting the whole request come first, then lower latency, then more
/// free slots.
pub(crate) fn alternative<'a>(
    pools: &'a [Arc<RegionPool>],
    from: &Departure<'_>,
    requested: SlotCount,
    elite_eligible: bool,
    latency: &LatencyModel,
    location: Option<GeoPoint>,
) -> Option<(&'a Arc<RegionPool>, f64)> {
    pools
        .iter()
        .filter(|p| p.id() != from.pool.id())
        .filter_map(|p| {
            let available = p.available_for(elite_eligible);
            if available == 0 {
                return None;
            }
            let ms = latency.estimate_ms(p.location(), location);
            let improves = match from.reason {
                MigrationReason::Capacity => available > from.available,
                MigrationReason::Latency => ms < from.latency_ms,
            };
            improves.then_some((p, ms, available))
        })
        .min_by(|(_, a_ms, a_av), (_, b_ms, b_av)| {
            let a_fits = *a_av >= requested;
            let b_fits = *b_av >= requested;
            b_fits
                .cmp(&a_fits)
                .then(a_ms.partial_cmp(b_ms).unwrap_or(Ordering::Equal))
                .then(b_av.cmp(a_av))
        })
        .map(|(p, ms, _)| (p, ms))
}
