//! Multi-region slot scheduler.
//!
//! Owns every [`RegionPool`], picks a region per request (preferred, nearest, at most one
//! migration) and aggregates region health into [`ClusterSnapshot`]s.
mod select;
mod sync;

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use fabric_model::{
    AllocationResult, ClusterConfig, ClusterSnapshot, GeoPoint, Migration, MigrationReason,
    RegionId, RegionSpec, SlotCount, Task, Tier,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    context::ClusterContext,
    error::{CoreError, CoreResult},
    region::{LatencyModel, RegionPool, SlotGrant},
};

use select::Departure;

#[derive(Debug, Default)]
struct Regions {
    pools: BTreeMap<RegionId, Arc<RegionPool>>,
    order: Vec<RegionId>,
}

impl Regions {
    fn in_order(&self) -> impl Iterator<Item = &Arc<RegionPool>> {
        self.order.iter().filter_map(|id| self.pools.get(id))
    }
}

pub struct ClusterScheduler {
    config: ClusterConfig,
    latency: LatencyModel,
    ctx: ClusterContext,
    regions: RwLock<Regions>,
    history: Mutex<VecDeque<ClusterSnapshot>>,
}

impl ClusterScheduler {
    /// Validate `config` and deploy every region it lists.
    pub fn new(config: ClusterConfig, ctx: ClusterContext) -> CoreResult<Self> {
        config.validate()?;
        let latency = LatencyModel::default().with_threshold(config.latency_threshold_ms);
        let scheduler = Self {
            regions: RwLock::new(Regions::default()),
            history: Mutex::new(VecDeque::with_capacity(config.history_limit.min(1_024))),
            latency,
            config,
            ctx,
        };
        for spec in scheduler.config.regions.clone() {
            scheduler.deploy_region(spec)?;
        }
        Ok(scheduler)
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn context(&self) -> &ClusterContext {
        &self.ctx
    }

    pub fn latency_model(&self) -> &LatencyModel {
        &self.latency
    }

    /// Provision a new region.
    ///
    /// Fails for a duplicate id or an invalid spec (zero capacity, elite fraction above 1%,
    /// coordinates out of range).
    #[instrument(level = "debug", skip(self, spec), fields(region = %spec.id))]
    pub fn deploy_region(&self, spec: RegionSpec) -> CoreResult<Arc<RegionPool>> {
        let pool = Arc::new(RegionPool::from_spec(&spec)?);
        let mut regions = self.regions.write().unwrap_or_else(PoisonError::into_inner);
        if regions.pools.contains_key(&spec.id) {
            return Err(CoreError::DuplicateRegion(spec.id));
        }
        regions.pools.insert(spec.id.clone(), pool.clone());
        regions.order.push(spec.id);
        info!(
            region = %pool.id(),
            name = %pool.name(),
            total = pool.total(),
            elite_reserved = pool.reserved_elite(),
            "region deployed"
        );
        Ok(pool)
    }

    /// Mark a region inactive; it is skipped by selection but still reported.
    pub fn deactivate_region(&self, id: &str) -> CoreResult<()> {
        let pool = self
            .region(id)
            .ok_or_else(|| CoreError::UnknownRegion(id.to_string()))?;
        if pool.set_active(false) {
            info!(region = %id, "region deactivated");
        }
        Ok(())
    }

    pub fn activate_region(&self, id: &str) -> CoreResult<()> {
        let pool = self
            .region(id)
            .ok_or_else(|| CoreError::UnknownRegion(id.to_string()))?;
        if !pool.set_active(true) {
            info!(region = %id, "region activated");
        }
        Ok(())
    }

    pub fn region(&self, id: &str) -> Option<Arc<RegionPool>> {
        self.regions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .pools
            .get(id)
            .cloned()
    }

    /// Every region in deployment order.
    pub fn regions(&self) -> Vec<Arc<RegionPool>> {
        self.regions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .in_order()
            .cloned()
            .collect()
    }

    fn active_regions(&self) -> Vec<Arc<RegionPool>> {
        self.regions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .in_order()
            .filter(|p| p.is_active())
            .cloned()
            .collect()
    }

    /// Sum of the totals of all active regions.
    pub fn total_active_capacity(&self) -> SlotCount {
        self.active_regions().iter().map(|p| p.total()).sum()
    }

    /// Per-request cap for non-VIP callers: `max(1, floor(capacity * fraction))`.
    pub fn non_vip_cap(&self, total_active: SlotCount) -> SlotCount {
        ((total_active as f64 * self.config.non_vip_request_fraction).floor() as SlotCount).max(1)
    }

    pub fn is_vip(&self, tier: &Tier) -> bool {
        self.config.is_vip(tier)
    }

    /// Whether a caller of `tier` with `score` may draw on the elite reserve.
    pub fn is_elite_eligible(&self, tier: &Tier, score: f64) -> bool {
        self.is_vip(tier) && score >= self.config.elite_score_threshold
    }

    /// Admission-time scheduling entry point.
    ///
    /// Picks a region, migrates at most once, and reserves slots. A zero grant on the final
    /// target is [`CoreError::CapacityExhausted`]; otherwise the grant may be partial.
    #[instrument(
        level = "debug",
        skip(self, task, tier),
        fields(task = %task.id, tier = %tier.label, requested = task.slots)
    )]
    pub fn allocate(
        &self,
        task: &Task,
        tier: &Tier,
        score: f64,
        location: Option<GeoPoint>,
    ) -> CoreResult<AllocationResult> {
        let pools = self.active_regions();
        let total_active: SlotCount = pools.iter().map(|p| p.total()).sum();

        let vip = self.is_vip(tier);
        let elite_eligible = self.is_elite_eligible(tier, score);
        let requested = task.slots;
        let effective_request = if vip {
            requested
        } else {
            requested.min(self.non_vip_cap(total_active))
        };

        let first = select::first_choice(
            &pools,
            task.region.as_deref(),
            self.config.default_region.as_deref(),
            location,
        )
        .ok_or(CoreError::NoActiveRegion)?;

        let first_latency = self.latency.estimate_ms(first.location(), location);
        let first_available = first.available_for(elite_eligible);
        let saturated = first_available < requested;
        let high_latency = self.latency.is_high(first_latency);

        let mut target = first;
        let mut latency_ms = first_latency;
        let mut migration = None;
        if saturated || high_latency {
            let departure = Departure {
                pool: first,
                reason: if saturated {
                    MigrationReason::Capacity
                } else {
                    MigrationReason::Latency
                },
                latency_ms: first_latency,
                available: first_available,
            };
            match select::alternative(
                &pools,
                &departure,
                requested,
                elite_eligible,
                &self.latency,
                location,
            ) {
                Some((alt, ms)) => {
                    debug!(
                        from = %first.id(),
                        to = %alt.id(),
                        reason = %departure.reason,
                        "migrating allocation"
                    );
                    migration = Some(Migration {
                        from: first.id().clone(),
                        to: alt.id().clone(),
                        reason: departure.reason,
                    });
                    target = alt;
                    latency_ms = ms;
                }
                None => debug!(
                    region = %first.id(),
                    saturated,
                    high_latency,
                    "no better region; keeping first choice"
                ),
            }
        }

        let grant = target.try_reserve(effective_request, elite_eligible);
        if grant.is_empty() {
            self.ctx.metrics().record_capacity_failure(target.id());
            warn!(task = %task.id, region = %target.id(), requested, "capacity exhausted");
            return Err(CoreError::CapacityExhausted {
                task_id: task.id.clone(),
                region: target.id().clone(),
                requested,
            });
        }
        let reliability = target.reliability_tick(self.ctx.entropy().as_ref());

        let metrics = self.ctx.metrics();
        metrics.record_allocation(target.id(), grant.total(), grant.elite);
        if let Some(m) = &migration {
            metrics.record_migration(&m.from, &m.to, m.reason);
        }
        debug!(
            region = %target.id(),
            granted = grant.total(),
            elite = grant.elite,
            latency_ms,
            "allocation granted"
        );

        Ok(AllocationResult {
            task_id: task.id.clone(),
            region_id: target.id().clone(),
            region_name: target.name().to_string(),
            requested,
            effective_request,
            granted: grant.total(),
            elite_granted: grant.elite,
            latency_ms,
            vip,
            elite_eligible,
            migration,
            reliability,
        })
    }

    /// Return slots of a finished allocation to its region.
    pub fn release(&self, allocation: &AllocationResult) -> CoreResult<SlotCount> {
        let pool = self
            .region(&allocation.region_id)
            .ok_or_else(|| CoreError::UnknownRegion(allocation.region_id.clone()))?;
        let grant = SlotGrant {
            general: allocation.granted - allocation.elite_granted,
            elite: allocation.elite_granted,
        };
        Ok(pool.release_grant(&grant))
    }
}

impl std::fmt::Debug for ClusterScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let regions = self.regions.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ClusterScheduler")
            .field("regions", &regions.order)
            .field("latency", &self.latency)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::{
        entropy::{ScriptedEntropy, SeededEntropy},
        metrics::{GenerationOutcome, MetricsBackend},
    };
    use fabric_model::TierRank;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const SF: GeoPoint = GeoPoint::new(37.7749, -122.4194);
    const BERLIN: GeoPoint = GeoPoint::new(52.52, 13.405);
    const POTSDAM: GeoPoint = GeoPoint::new(52.3906, 13.0645);

    #[derive(Default)]
    struct CountingMetrics {
        allocations: AtomicU64,
        migrations: AtomicU64,
        capacity_failures: AtomicU64,
    }

    impl MetricsBackend for CountingMetrics {
        fn record_admission(&self, _: bool, _: f64) {}
        fn record_allocation(&self, _: &str, _: u64, _: u64) {
            self.allocations.fetch_add(1, Ordering::Relaxed);
        }
        fn record_migration(&self, _: &str, _: &str, _: MigrationReason) {
            self.migrations.fetch_add(1, Ordering::Relaxed);
        }
        fn record_capacity_failure(&self, _: &str) {
            self.capacity_failures.fetch_add(1, Ordering::Relaxed);
        }
        fn record_generation(&self, _: GenerationOutcome, _: u64) {}
    }

    fn ctx() -> ClusterContext {
        ClusterContext::default().with_entropy(Arc::new(ScriptedEntropy::midpoint()))
    }

    fn scheduler(regions: Vec<RegionSpec>) -> ClusterScheduler {
        let config = ClusterConfig {
            regions,
            ..ClusterConfig::default()
        };
        ClusterScheduler::new(config, ctx()).unwrap()
    }

    fn region(id: &str, at: GeoPoint, total: SlotCount) -> RegionSpec {
        RegionSpec::new(id, at, total)
    }

    fn vip() -> Tier {
        Tier::new("one_percent", TierRank::Premium)
    }

    fn regular() -> Tier {
        Tier::new("starter", TierRank::Standard)
    }

    fn task(slots: SlotCount) -> Task {
        Task::new("t1", "caller", "prompt").with_slots(slots)
    }

    #[test]
    fn scenario_a_vip_elite_path() {
        let s = scheduler(vec![region("a", SF, 1_000)]);
        let r = s.allocate(&task(500), &vip(), 97.0, None).unwrap();
        assert_eq!(r.granted, 500);
        assert_eq!(r.elite_granted, 10);
        assert!(r.vip && r.elite_eligible);
        assert!(r.migration.is_none());
        assert_eq!(s.region("a").unwrap().used(), 500);
    }

    #[test]
    fn scenario_b_non_vip_cap_single_region() {
        let s = scheduler(vec![region("a", SF, 1_000)]);
        s.region("a").unwrap().try_reserve(950, false);

        let r = s.allocate(&task(200), &regular(), 91.0, None).unwrap();
        assert_eq!(r.effective_request, 2);
        assert_eq!(r.granted, 2);
        assert_eq!(r.elite_granted, 0);
        assert!(r.migration.is_none(), "no other region to move to");
    }

    #[test]
    fn scenario_b_migrates_when_second_region_has_capacity() {
        let s = scheduler(vec![region("a", SF, 1_000), region("b", BERLIN, 400)]);
        s.region("a").unwrap().try_reserve(950, false);

        let r = s.allocate(&task(200), &regular(), 91.0, None).unwrap();
        assert_eq!(s.non_vip_cap(1_400), 2);
        assert_eq!(r.granted, 2);
        assert_eq!(r.region_id, "b");
        let m = r.migration.expect("expected a capacity migration");
        assert_eq!((m.from.as_str(), m.to.as_str()), ("a", "b"));
        assert_eq!(m.reason, MigrationReason::Capacity);
        assert_eq!(s.region("a").unwrap().used(), 950);
    }

    #[test]
    fn elite_grant_requires_vip_and_score() {
        for (tier, score, expect_elite) in [
            (vip(), 97.0, true),
            (vip(), 94.9, false),
            (regular(), 97.0, false),
            (regular(), 94.9, false),
        ] {
            let s = scheduler(vec![region("a", SF, 1_000)]);
            let r = s.allocate(&task(100), &tier, score, None).unwrap();
            assert_eq!(
                r.elite_granted > 0,
                expect_elite,
                "tier {tier} score {score}: elite {}",
                r.elite_granted
            );
            assert_eq!(r.elite_eligible, expect_elite);
            assert_eq!(s.region("a").unwrap().elite_used(), r.elite_granted);
        }
    }

    #[test]
    fn elite_threshold_is_inclusive() {
        let s = scheduler(vec![region("a", SF, 1_000)]);
        assert!(s.is_elite_eligible(&vip(), 95.0));
        assert!(!s.is_elite_eligible(&vip(), 94.999));
        assert!(s.is_elite_eligible(&Tier::new("anything", TierRank::Elite), 95.0));
    }

    #[test]
    fn non_vip_grant_never_exceeds_cap() {
        let s = scheduler(ClusterConfig::default_regions());
        let cap = (100_000.0_f64 * 0.002).floor() as SlotCount;
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..300 {
            let requested = rng.gen_range(1..50_000);
            let r = s.allocate(&task(requested), &regular(), 93.0, None).unwrap();
            assert!(r.granted <= cap, "granted {} above cap {cap}", r.granted);
            assert!(r.granted <= requested);
        }
    }

    #[test]
    fn cap_is_at_least_one_slot() {
        let s = scheduler(vec![region("a", SF, 100)]);
        assert_eq!(s.non_vip_cap(100), 1);
        let r = s.allocate(&task(50), &regular(), 91.0, None).unwrap();
        assert_eq!(r.granted, 1);
    }

    #[test]
    fn healthy_region_never_migrates() {
        let s = scheduler(vec![region("us", SF, 10_000), region("eu", BERLIN, 10_000)]);
        let r = s.allocate(&task(10).with_region("eu"), &vip(), 97.0, Some(POTSDAM)).unwrap();
        assert_eq!(r.region_id, "eu");
        assert!(r.migration.is_none());

        let r = s.allocate(&task(10), &regular(), 91.0, None).unwrap();
        assert_eq!(r.region_id, "us", "first deployed region is the default");
        assert_eq!(r.latency_ms, 45.0);
        assert!(r.migration.is_none());
    }

    #[test]
    fn nearest_region_is_first_choice() {
        let s = scheduler(vec![region("us", SF, 10_000), region("eu", BERLIN, 10_000)]);
        let r = s.allocate(&task(10), &regular(), 91.0, Some(POTSDAM)).unwrap();
        assert_eq!(r.region_id, "eu");
        assert_eq!(r.latency_ms, 25.0);
        assert!(r.migration.is_none());
    }

    #[test]
    fn far_preferred_region_migrates_for_latency() {
        let metrics = Arc::new(CountingMetrics::default());
        let config = ClusterConfig {
            regions: vec![region("us", SF, 10_000), region("eu", BERLIN, 10_000)],
            ..ClusterConfig::default()
        };
        let s = ClusterScheduler::new(config, ctx().with_metrics(metrics.clone())).unwrap();

        let r = s.allocate(&task(10).with_region("us"), &vip(), 97.0, Some(POTSDAM)).unwrap();
        assert_eq!(r.region_id, "eu");
        assert_eq!(
            r.migration,
            Some(Migration {
                from: "us".into(),
                to: "eu".into(),
                reason: MigrationReason::Latency,
            })
        );
        assert_eq!(metrics.migrations.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.allocations.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn latency_move_needs_a_faster_region() {
        let s = scheduler(vec![region("us", SF, 10_000), region("eu", BERLIN, 10_000)]);
        let tokyo = GeoPoint::new(35.68, 139.69);
        let r = s.allocate(&task(10).with_region("us"), &vip(), 97.0, Some(tokyo)).unwrap();
        assert_eq!(r.region_id, "us");
        assert_eq!(r.latency_ms, 180.0);
        assert!(r.migration.is_none());
    }

    #[test]
    fn capacity_move_prefers_region_that_fits() {
        let s = scheduler(vec![
            region("a", SF, 1_000),
            region("b", BERLIN, 1_000),
            region("c", GeoPoint::new(13.0827, 80.2707), 10_000),
        ]);
        s.region("a").unwrap().try_reserve(990, false);
        s.region("b").unwrap().try_reserve(900, false);

        let r = s.allocate(&task(500), &vip(), 90.0, None).unwrap();
        assert_eq!(r.region_id, "c");
        assert_eq!(r.granted, 500);
        assert_eq!(r.migration.map(|m| m.reason), Some(MigrationReason::Capacity));
    }

    #[test]
    fn exhausted_cluster_is_a_hard_failure() {
        let metrics = Arc::new(CountingMetrics::default());
        let config = ClusterConfig {
            regions: vec![region("a", SF, 1_000), region("b", BERLIN, 1_000)],
            ..ClusterConfig::default()
        };
        let s = ClusterScheduler::new(config, ctx().with_metrics(metrics.clone())).unwrap();
        s.region("a").unwrap().try_reserve(1_000, true);
        s.region("b").unwrap().try_reserve(1_000, true);

        match s.allocate(&task(10), &vip(), 99.0, None) {
            Err(CoreError::CapacityExhausted { requested, .. }) => assert_eq!(requested, 10),
            other => panic!("expected CapacityExhausted, got {other:?}"),
        }
        assert_eq!(metrics.capacity_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.allocations.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn request_above_whole_cluster_gets_partial_grant() {
        let s = scheduler(vec![region("a", SF, 1_000), region("b", BERLIN, 500)]);
        let r = s.allocate(&task(5_000), &vip(), 99.0, None).unwrap();
        assert_eq!(r.region_id, "a");
        assert_eq!(r.granted, 1_000);
        assert!(r.is_partial());
        assert!(r.migration.is_none(), "no region offers more than the first choice");
    }

    #[test]
    fn non_eligible_caller_sees_reserve_as_full() {
        let s = scheduler(vec![region("a", SF, 1_000)]);
        s.region("a").unwrap().try_reserve(990, false);
        match s.allocate(&task(1), &regular(), 91.0, None) {
            Err(CoreError::CapacityExhausted { region, .. }) => assert_eq!(region, "a"),
            other => panic!("expected CapacityExhausted, got {other:?}"),
        }
        let r = s.allocate(&task(1), &vip(), 96.0, None).unwrap();
        assert_eq!(r.elite_granted, 1);
    }

    #[test]
    fn inactive_regions_are_skipped() {
        let s = scheduler(vec![region("us", SF, 1_000), region("eu", BERLIN, 1_000)]);
        s.deactivate_region("us").unwrap();
        let r = s.allocate(&task(5).with_region("us"), &regular(), 91.0, None).unwrap();
        assert_eq!(r.region_id, "eu");
        assert!(r.migration.is_none());
        assert_eq!(s.total_active_capacity(), 1_000);

        s.deactivate_region("eu").unwrap();
        assert!(matches!(
            s.allocate(&task(5), &regular(), 91.0, None),
            Err(CoreError::NoActiveRegion)
        ));
        assert!(matches!(
            s.deactivate_region("mars"),
            Err(CoreError::UnknownRegion(_))
        ));
    }

    #[test]
    fn deploy_rejects_duplicates_and_bad_specs() {
        let s = scheduler(vec![region("a", SF, 1_000)]);
        assert!(matches!(
            s.deploy_region(region("a", SF, 10)),
            Err(CoreError::DuplicateRegion(id)) if id == "a"
        ));
        assert!(matches!(
            s.deploy_region(region("z", SF, 0)),
            Err(CoreError::Model(_))
        ));
        assert!(matches!(
            s.deploy_region(region("z", SF, 10).with_elite_fraction(0.05)),
            Err(CoreError::Model(_))
        ));
        let pool = s.deploy_region(region("b", BERLIN, 2_000)).unwrap();
        assert_eq!(pool.reserved_elite(), 20);
        assert_eq!(s.regions().len(), 2);
    }

    #[test]
    fn release_returns_slots() {
        let s = scheduler(vec![region("a", SF, 1_000)]);
        let r = s.allocate(&task(100), &vip(), 97.0, None).unwrap();
        assert_eq!(s.release(&r).unwrap(), 100);
        assert_eq!(s.region("a").unwrap().used(), 0);
        assert_eq!(s.region("a").unwrap().elite_used(), 0);
    }

    #[test]
    fn sync_reports_every_region_and_bounds_history() {
        let config = ClusterConfig {
            history_limit: 3,
            ..ClusterConfig::default()
        };
        let s = ClusterScheduler::new(config, ctx()).unwrap();
        s.allocate(&task(300), &vip(), 97.0, None).unwrap();
        s.deactivate_region("in").unwrap();

        for _ in 0..5 {
            s.sync();
        }
        let snap = s.last_snapshot().unwrap();
        assert_eq!(s.history().len(), 3);
        assert_eq!(snap.regions.len(), 3);
        assert_eq!(snap.total_capacity, 100_000);
        assert_eq!(snap.total_used, 300);
        assert_eq!(snap.regions["us"].used, 300);
        assert_eq!(snap.regions["us"].elite_used, 300);
        assert_eq!(snap.regions["us"].tasks_served, 1);
        assert!(!snap.regions["in"].active);
        assert_eq!(snap.active_regions(), 2);
        assert!((snap.average_reliability - 99.2).abs() < 1e-9);
        // a fresh cluster is not reported below its default target
        assert!(snap.average_reliability + 1e-9 >= snap.reliability_target);
        assert_eq!(snap.vip_tiers, s.config().vip_tiers);
    }

    #[test]
    fn concurrent_allocations_never_overflow() {
        let config = ClusterConfig {
            regions: vec![region("a", SF, 2_000), region("b", BERLIN, 1_500)],
            ..ClusterConfig::default()
        };
        let ctx = ClusterContext::default().with_entropy(Arc::new(SeededEntropy::new(5)));
        let s = Arc::new(ClusterScheduler::new(config, ctx).unwrap());
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let s = s.clone();
                std::thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(t);
                    for i in 0..200 {
                        let tier = if rng.gen_bool(0.5) { vip() } else { regular() };
                        let t = Task::new(format!("t{t}-{i}"), "c", "p")
                            .with_slots(rng.gen_range(1..400));
                        if let Ok(r) = s.allocate(&t, &tier, rng.gen_range(90.0..100.0), None) {
                            if rng.gen_bool(0.5) {
                                s.release(&r).unwrap();
                            }
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = s.sync();
        assert!(snap.total_used <= snap.total_capacity);
        for r in snap.regions.values() {
            assert!(r.used <= r.total);
            assert!(r.elite_used <= r.elite_reserved);
        }
    }

    #[tokio::test]
    async fn sync_loop_runs_until_cancelled() {
        let s = Arc::new(scheduler(vec![region("a", SF, 1_000)]));
        let cancel = tokio_util::sync::CancellationToken::new();
        let handle = s.spawn_sync_loop(std::time::Duration::from_millis(5), cancel.clone());

        tokio::time::sleep(std::time::Duration::from_millis(40)).await;
        cancel.cancel();
        handle.await.unwrap();

        let seen = s.history().len();
        assert!(seen >= 1, "expected at least one snapshot");
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(s.history().len(), seen, "loop kept running after cancel");
    }
}
