//! Structured events for cluster snapshots and task outcomes.
use fabric_model::{ClusterSnapshot, ProcessOutcome, ProcessResponse};
use tracing::{debug, info, warn};

/// Utilization above which a snapshot is logged at warn level.
const HIGH_UTILIZATION: f64 = 0.9;

/// Emit one summary event for `snapshot` plus one debug event per region.
///
/// Snapshots below their reliability target or above 90% utilization are warnings.
pub fn log_snapshot(snapshot: &ClusterSnapshot) {
    let utilization = snapshot.utilization();
    let degraded = snapshot.average_reliability < snapshot.reliability_target;
    let busy = utilization > HIGH_UTILIZATION;

    if degraded || busy {
        warn!(
            regions = snapshot.regions.len(),
            active = snapshot.active_regions(),
            capacity = snapshot.total_capacity,
            used = snapshot.total_used,
            utilization,
            reliability = snapshot.average_reliability,
            target = snapshot.reliability_target,
            "cluster under pressure"
        );
    } else {
        info!(
            regions = snapshot.regions.len(),
            active = snapshot.active_regions(),
            capacity = snapshot.total_capacity,
            used = snapshot.total_used,
            utilization,
            reliability = snapshot.average_reliability,
            "cluster synced"
        );
    }

    for (id, region) in &snapshot.regions {
        debug!(
            region = %id,
            name = %region.name,
            active = region.active,
            available = region.available,
            used = region.used,
            elite_used = region.elite_used,
            elite_reserved = region.elite_reserved,
            served = region.tasks_served,
            reliability = region.reliability,
            idle_hours = region.idle_hours,
            "region"
        );
    }
}

/// Emit one event describing how a task ended.
pub fn log_response(response: &ProcessResponse) {
    let task = response.task_id.as_str();
    let score = response.score.value;
    match &response.outcome {
        ProcessOutcome::Rejected { reason } => {
            info!(task, score, reason = %reason, "task rejected");
        }
        ProcessOutcome::CapacityFailed { reason } => {
            warn!(task, score, tier = %response.tier, reason = %reason, "task not placed");
        }
        ProcessOutcome::Completed {
            allocation,
            output,
            delivery,
        } => {
            let region = allocation.as_ref().map(|a| a.region_id.as_str());
            let granted = allocation.as_ref().map(|a| a.granted);
            let migration = allocation
                .as_ref()
                .and_then(|a| a.migration.as_ref())
                .map(|m| m.reason.as_str());
            if output.is_failed() {
                warn!(
                    task,
                    score,
                    tier = %response.tier,
                    region,
                    granted,
                    migration,
                    elapsed_ms = response.elapsed_ms,
                    output = %output,
                    "task completed with failed output"
                );
            } else {
                info!(
                    task,
                    score,
                    tier = %response.tier,
                    region,
                    granted,
                    migration,
                    delivery = delivery.as_deref(),
                    elapsed_ms = response.elapsed_ms,
                    "task completed"
                );
            }
        }
    }
}
