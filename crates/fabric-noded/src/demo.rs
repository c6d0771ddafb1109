use fabric_model::{FulfillmentRequest, GeoPoint, PriorityClass, Task, Tier, TierRank};

use crate::config::DaemonConfig;

const POTSDAM: GeoPoint = GeoPoint::new(52.3906, 13.0645);
const MUMBAI: GeoPoint = GeoPoint::new(19.076, 72.8777);

/// Fill in the demo batch (and its callers' tiers) when no tasks are configured.
pub fn apply(cfg: &mut DaemonConfig) {
    if !cfg.tasks.is_empty() {
        return;
    }
    cfg.tasks = tasks();
    for (caller, tier) in tiers() {
        cfg.tiers.entry(caller.to_string()).or_insert(tier);
    }
}

fn tiers() -> [(&'static str, Tier); 2] {
    [
        ("vip-berlin", Tier::new("one_percent", TierRank::Premium)),
        ("pro-mumbai", Tier::new("pro", TierRank::Premium)),
    ]
}

/// Start-up batch exercising rejection, VIP placement, migration and fulfillment.
pub fn tasks() -> Vec<Task> {
    vec![
        Task::new("demo-common", "guest", "hello")
            .with_priority(PriorityClass::Low)
            .with_complexity(1.0),
        Task::new("demo-vip-eu", "vip-berlin", "render the launch trailer in 8k")
            .with_priority(PriorityClass::Critical)
            .with_complexity(10.0)
            .with_payload("x".repeat(20_000))
            .with_location(POTSDAM)
            .with_slots(800),
        Task::new("demo-vip-us-pref", "vip-berlin", "analyze the quarterly telemetry dump")
            .with_task_type("analyze")
            .with_priority(PriorityClass::Critical)
            .with_complexity(9.0)
            .with_payload("y".repeat(30_000))
            .with_region("us")
            .with_location(POTSDAM),
        Task::new("demo-delivery", "pro-mumbai", "summarize the courier manifest")
            .with_task_type("summarize")
            .with_priority(PriorityClass::Critical)
            .with_complexity(10.0)
            .with_payload("z".repeat(25_000))
            .with_location(MUMBAI)
            .with_fulfillment(FulfillmentRequest::new(MUMBAI, GeoPoint::new(19.0176, 72.8562))),
    ]
}
