use std::{collections::BTreeMap, sync::Arc, sync::PoisonError, time::Duration, time::Instant};

use fabric_model::{ClusterSnapshot, SlotCount};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::ClusterScheduler;
use crate::clock::now_unix_ms;

impl ClusterScheduler {
    /// Walk every region into one snapshot and append it to the bounded history.
    pub fn sync(&self) -> ClusterSnapshot {
        let now = Instant::now();
        let pools = self.regions();

        let mut regions = BTreeMap::new();
        let mut total_capacity: SlotCount = 0;
        let mut total_used: SlotCount = 0;
        let mut reliability_sum = 0.0;
        for pool in &pools {
            let report = pool.report(now);
            total_capacity += report.total;
            total_used += report.used;
            reliability_sum += report.reliability;
            regions.insert(pool.id().clone(), report);
        }
        let average_reliability = if pools.is_empty() {
            0.0
        } else {
            reliability_sum / pools.len() as f64
        };

        let snapshot = ClusterSnapshot {
            timestamp_ms: now_unix_ms(),
            reliability_target: self.config.reliability_target,
            average_reliability,
            total_capacity,
            total_used,
            regions,
            vip_tiers: self.config.vip_tiers.clone(),
        };

        let limit = self.config.history_limit;
        if limit > 0 {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            while history.len() >= limit {
                history.pop_front();
            }
            history.push_back(snapshot.clone());
        }
        debug!(
            regions = snapshot.regions.len(),
            used = total_used,
            capacity = total_capacity,
            reliability = average_reliability,
            "cluster sync"
        );
        snapshot
    }

    /// Retained snapshots, oldest first.
    pub fn history(&self) -> Vec<ClusterSnapshot> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn last_snapshot(&self) -> Option<ClusterSnapshot> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    /// Run [`ClusterScheduler::sync`] every `interval` until `cancel` fires.
    ///
    /// The first sync happens immediately. Must be called inside a tokio runtime.
    pub fn spawn_sync_loop(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(interval_ms = interval.as_millis() as u64, "sync loop started");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let snap = scheduler.sync();
                        info!(
                            reliability = snap.average_reliability,
                            target = snap.reliability_target,
                            regions = snap.regions.len(),
                            used = snap.total_used,
                            capacity = snap.total_capacity,
                            "sync"
                        );
                    }
                }
            }
            debug!("sync loop stopped");
        })
    }
}
