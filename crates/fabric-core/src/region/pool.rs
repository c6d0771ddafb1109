//! Capacity accounting of a single region.
//!
//! Capacity is split into two partitions:
//! - general: `total - reserved_elite`, open to every caller;
//! - elite: `reserved_elite`, drawn only by elite-eligible requests.
//!
//! All counters live behind one mutex so a reservation is a single check-and-increment.
use std::{
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use fabric_model::{
    GeoPoint, RELIABILITY_CEILING_PCT, RELIABILITY_FLOOR_PCT, RELIABILITY_START_PCT, RegionId,
    RegionReport, RegionSpec, SlotCount,
};
use tracing::trace;

use crate::{entropy::Entropy, error::CoreResult};

/// Largest reliability change applied by one tick.
const RELIABILITY_STEP_PCT: f64 = 0.05;

/// Slots handed out by one reservation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotGrant {
    pub general: SlotCount,
    pub elite: SlotCount,
}

impl SlotGrant {
    #[inline]
    pub fn total(&self) -> SlotCount {
        self.general + self.elite
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Debug)]
struct PoolState {
    general_used: SlotCount,
    elite_used: SlotCount,
    reliability: f64,
    tasks_served: u64,
    last_touched: Instant,
}

#[derive(Debug)]
pub struct RegionPool {
    id: RegionId,
    name: String,
    location: GeoPoint,
    total: SlotCount,
    reserved_elite: SlotCount,
    active: AtomicBool,
    state: Mutex<PoolState>,
}

impl RegionPool {
    /// Build an active pool from a validated spec.
    pub fn from_spec(spec: &RegionSpec) -> CoreResult<Self> {
        spec.validate()?;
        Ok(Self {
            id: spec.id.clone(),
            name: spec.display_name().to_string(),
            location: spec.location,
            total: spec.total,
            reserved_elite: spec.reserved_elite().min(spec.total),
            active: AtomicBool::new(true),
            state: Mutex::new(PoolState {
                general_used: 0,
                elite_used: 0,
                reliability: RELIABILITY_START_PCT,
                tasks_served: 0,
                last_touched: Instant::now(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn general_capacity(&self) -> SlotCount {
        self.total - self.reserved_elite
    }

    fn check_invariants(&self, st: &PoolState) {
        debug_assert!(
            st.general_used <= self.general_capacity(),
            "region {}: general usage {} exceeds partition {}",
            self.id,
            st.general_used,
            self.general_capacity()
        );
        debug_assert!(
            st.elite_used <= self.reserved_elite,
            "region {}: elite usage {} exceeds reserve {}",
            self.id,
            st.elite_used,
            self.reserved_elite
        );
        debug_assert!(st.general_used + st.elite_used <= self.total);
    }

    /// Atomically reserve up to `amount` slots.
    ///
    /// Elite-eligible requests draw on the remaining elite reserve first and then on the
    /// general partition; other requests only see the general partition. The grant may be
    /// partial or empty; an inactive region always returns an empty grant.
    pub fn try_reserve(&self, amount: SlotCount, elite_eligible: bool) -> SlotGrant {
        if amount == 0 || !self.is_active() {
            return SlotGrant::default();
        }
        let mut st = self.lock();

        let elite = if elite_eligible {
            amount.min(self.reserved_elite - st.elite_used)
        } else {
            0
        };
        let general = (amount - elite).min(self.general_capacity() - st.general_used);
        let grant = SlotGrant { general, elite };

        if !grant.is_empty() {
            st.general_used += general;
            st.elite_used += elite;
            st.tasks_served += 1;
            st.last_touched = Instant::now();
        }
        self.check_invariants(&st);
        trace!(region = %self.id, amount, general, elite, "reserve");
        grant
    }

    /// Return `amount` slots, general usage first; floored at zero. Returns slots released.
    pub fn release(&self, amount: SlotCount) -> SlotCount {
        let mut st = self.lock();
        let general = amount.min(st.general_used);
        let elite = (amount - general).min(st.elite_used);
        st.general_used -= general;
        st.elite_used -= elite;
        if general + elite > 0 {
            st.last_touched = Instant::now();
        }
        self.check_invariants(&st);
        general + elite
    }

    /// Return exactly the slots of a previous grant; floored at zero per partition.
    pub fn release_grant(&self, grant: &SlotGrant) -> SlotCount {
        let mut st = self.lock();
        let general = grant.general.min(st.general_used);
        let elite = grant.elite.min(st.elite_used);
        st.general_used -= general;
        st.elite_used -= elite;
        if general + elite > 0 {
            st.last_touched = Instant::now();
        }
        self.check_invariants(&st);
        general + elite
    }

    /// Nudge reliability by a uniform step in `[-0.05, 0.05]`, clamped to its band.
    pub fn reliability_tick(&self, entropy: &dyn Entropy) -> f64 {
        let step = entropy.uniform(-RELIABILITY_STEP_PCT, RELIABILITY_STEP_PCT);
        let mut st = self.lock();
        st.reliability =
            (st.reliability + step).clamp(RELIABILITY_FLOOR_PCT, RELIABILITY_CEILING_PCT);
        st.reliability
    }

    /// Free slots in both partitions.
    pub fn available(&self) -> SlotCount {
        let st = self.lock();
        self.total - st.general_used - st.elite_used
    }

    /// Free slots this caller could be granted.
    pub fn available_for(&self, elite_eligible: bool) -> SlotCount {
        let st = self.lock();
        let general = self.general_capacity() - st.general_used;
        if elite_eligible {
            general + (self.reserved_elite - st.elite_used)
        } else {
            general
        }
    }

    pub fn id(&self) -> &RegionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn total(&self) -> SlotCount {
        self.total
    }

    pub fn reserved_elite(&self) -> SlotCount {
        self.reserved_elite
    }

    pub fn used(&self) -> SlotCount {
        let st = self.lock();
        st.general_used + st.elite_used
    }

    pub fn elite_used(&self) -> SlotCount {
        self.lock().elite_used
    }

    pub fn reliability(&self) -> f64 {
        self.lock().reliability
    }

    pub fn tasks_served(&self) -> u64 {
        self.lock().tasks_served
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark the region active or inactive; returns the previous flag.
    pub fn set_active(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::AcqRel)
    }

    /// Consistent view of the counters, taken under the pool lock.
    pub fn report(&self, now: Instant) -> RegionReport {
        let st = self.lock();
        let used = st.general_used + st.elite_used;
        RegionReport {
            name: self.name.clone(),
            active: self.is_active(),
            total: self.total,
            available: self.total - used,
            used,
            elite_reserved: self.reserved_elite,
            elite_used: st.elite_used,
            tasks_served: st.tasks_served,
            reliability: st.reliability,
            idle_hours: now.saturating_duration_since(st.last_touched).as_secs_f64() / 3_600.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::entropy::{ScriptedEntropy, SeededEntropy};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn pool(total: SlotCount) -> RegionPool {
        RegionPool::from_spec(&RegionSpec::new("us", GeoPoint::new(37.7749, -122.4194), total))
            .unwrap()
    }

    #[test]
    fn eligible_request_draws_elite_first() {
        let p = pool(1_000);
        assert_eq!(p.reserved_elite(), 10);
        let g = p.try_reserve(500, true);
        assert_eq!(g, SlotGrant { general: 490, elite: 10 });
        assert_eq!(p.used(), 500);
        assert_eq!(p.elite_used(), 10);
        assert_eq!(p.tasks_served(), 1);
    }

    #[test]
    fn non_eligible_request_never_touches_reserve() {
        let p = pool(1_000);
        let g = p.try_reserve(5_000, false);
        assert_eq!(g, SlotGrant { general: 990, elite: 0 });
        assert_eq!(p.available(), 10);
        assert_eq!(p.available_for(false), 0);
        assert!(p.try_reserve(1, false).is_empty());

        let g = p.try_reserve(50, true);
        assert_eq!(g, SlotGrant { general: 0, elite: 10 });
        assert_eq!(p.used(), 1_000);
    }

    #[test]
    fn empty_grant_does_not_count_as_served() {
        let p = pool(100);
        p.try_reserve(100, false);
        let served = p.tasks_served();
        assert!(p.try_reserve(10, false).is_empty());
        assert_eq!(p.tasks_served(), served);
        assert!(p.try_reserve(0, true).is_empty());
    }

    #[test]
    fn release_is_floored_at_zero() {
        let p = pool(1_000);
        p.try_reserve(20, true);
        assert_eq!(p.release(15), 15);
        assert_eq!(p.used(), 5);
        assert_eq!(p.elite_used(), 5);
        assert_eq!(p.release(100), 5);
        assert_eq!(p.used(), 0);
        assert_eq!(p.release(1), 0);
    }

    #[test]
    fn release_grant_returns_exact_partitions() {
        let p = pool(1_000);
        let a = p.try_reserve(30, true);
        let b = p.try_reserve(30, false);
        assert_eq!(p.release_grant(&a), 30);
        assert_eq!(p.elite_used(), 0);
        assert_eq!(p.used(), 30);
        assert_eq!(p.release_grant(&b), 30);
        assert_eq!(p.used(), 0);
    }

    #[test]
    fn inactive_pool_grants_nothing() {
        let p = pool(1_000);
        assert!(p.set_active(false));
        assert!(p.try_reserve(10, true).is_empty());
        assert!(!p.report(Instant::now()).active);
    }

    #[test]
    fn reliability_stays_in_band() {
        let p = pool(10);
        let up = ScriptedEntropy::new(vec![0.999]);
        for _ in 0..100 {
            p.reliability_tick(&up);
        }
        assert_eq!(p.reliability(), RELIABILITY_CEILING_PCT);

        let down = ScriptedEntropy::new(vec![0.0]);
        for _ in 0..100 {
            p.reliability_tick(&down);
        }
        assert_eq!(p.reliability(), RELIABILITY_FLOOR_PCT);

        let mid = ScriptedEntropy::midpoint();
        let before = p.reliability();
        assert_eq!(p.reliability_tick(&mid), before);
    }

    #[test]
    fn reliability_random_walk_is_bounded() {
        let p = pool(10);
        let e = SeededEntropy::new(3);
        for _ in 0..10_000 {
            let r = p.reliability_tick(&e);
            assert!((RELIABILITY_FLOOR_PCT..=RELIABILITY_CEILING_PCT).contains(&r));
        }
    }

    #[test]
    fn concurrent_reserve_release_keeps_invariants() {
        let p = Arc::new(pool(1_000));
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let p = p.clone();
                std::thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(t);
                    let mut held = Vec::new();
                    for _ in 0..2_000 {
                        if rng.gen_bool(0.6) {
                            let amount = rng.gen_range(0..300);
                            let g = p.try_reserve(amount, rng.gen_bool(0.3));
                            assert!(g.total() <= amount);
                            held.push(g);
                        } else if let Some(g) = held.pop() {
                            p.release_grant(&g);
                        }
                        let r = p.report(Instant::now());
                        assert!(r.used <= r.total, "used {} > total {}", r.used, r.total);
                        assert!(r.elite_used <= r.elite_reserved);
                    }
                    held
                })
            })
            .collect();

        let mut outstanding = 0;
        for h in handles {
            outstanding += h.join().unwrap().iter().map(SlotGrant::total).sum::<SlotCount>();
        }
        assert_eq!(p.used(), outstanding);
        assert!(p.reserved_elite() <= (p.total() as f64 * 0.01).floor() as SlotCount);
    }
}
