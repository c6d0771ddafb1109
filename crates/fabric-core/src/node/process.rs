use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use fabric_model::{
    AllocationResult, FulfillmentRequest, GenerationRequest, ProcessOutcome, ProcessResponse,
    RarityScore, Rejection, Task, TaskId, TaskOutput, TaskState, Tier,
};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::NodeRuntime;
use crate::{
    clock::now_unix_ms, error::CollaboratorError, metrics::GenerationOutcome, ports::Work,
    scheduler::ClusterScheduler,
};

const REPUTATION_GAIN: f64 = 0.5;
const REPUTATION_LOSS: f64 = 1.0;

impl NodeRuntime {
    /// Score, admit, allocate, execute and (optionally) dispatch one task.
    ///
    /// Rejections and capacity failures are outcomes, not errors. A generator failure still
    /// completes the task with a [`TaskOutput::Failed`] output.
    #[instrument(level = "debug", skip(self, task), fields(node = %self.config.node_id, task = %task.id))]
    pub async fn process(&self, task: Task) -> ProcessResponse {
        let started = Instant::now();
        let meta = task.metadata(now_unix_ms());
        let score = self.policy.score(&meta, self.ctx.entropy().as_ref());

        if !self.is_running() {
            return respond(&task.id, score, String::new(), started, ProcessOutcome::Rejected {
                reason: Rejection::NodeStopped,
            });
        }

        self.book.open(&task.id);
        self.record_score(&score);
        self.mark(&task.id, TaskState::Scored);

        if !score.admitted {
            self.mark(&task.id, TaskState::Rejected);
            info!(score = score.value, threshold = score.threshold, "task rejected");
            return respond(&task.id, score, String::new(), started, ProcessOutcome::Rejected {
                reason: Rejection::Rarity {
                    score: score.value,
                    threshold: score.threshold,
                },
            });
        }
        self.mark(&task.id, TaskState::Admitted);

        let tier = self.resolve_tier(&task.origin).await;
        let vip = self
            .scheduler
            .as_ref()
            .is_some_and(|s| s.is_vip(&tier));

        let mut lease = None;
        let allocation = match &self.scheduler {
            Some(scheduler) => {
                self.mark(&task.id, TaskState::Allocating);
                match scheduler.allocate(&task, &tier, score.value, task.location) {
                    Ok(alloc) => {
                        self.mark(&task.id, TaskState::Allocated);
                        if self.config.release_on_completion {
                            lease = Some(SlotLease::new(Arc::clone(scheduler), alloc.clone()));
                        }
                        Some(alloc)
                    }
                    Err(e) => {
                        self.mark(&task.id, TaskState::CapacityFailed);
                        warn!(error = %e, "allocation failed");
                        return respond(
                            &task.id,
                            score,
                            tier.label,
                            started,
                            ProcessOutcome::CapacityFailed {
                                reason: e.to_string(),
                            },
                        );
                    }
                }
            }
            None => None,
        };

        self.mark(&task.id, TaskState::Executing);
        let output = self.execute(&task).await;

        let delivery = match &task.fulfillment {
            Some(request) => self.dispatch(&task, request, score.value, vip).await,
            None => None,
        };

        drop(lease);

        self.mark(&task.id, TaskState::Completed);
        self.lock().tasks_completed += 1;
        info!(
            score = score.value,
            region = allocation.as_ref().map(|a| a.region_id.as_str()).unwrap_or("-"),
            failed = output.is_failed(),
            "task completed"
        );

        respond(&task.id, score, tier.label, started, ProcessOutcome::Completed {
            allocation,
            output,
            delivery,
        })
    }

    fn record_score(&self, score: &RarityScore) {
        {
            let mut st = self.lock();
            st.tasks_processed += 1;
            st.scoring.record(score.value, score.admitted);
        }
        self.ctx.metrics().record_admission(score.admitted, score.value);
    }

    fn mark(&self, id: &TaskId, state: TaskState) {
        if let Err(e) = self.book.advance(id, state) {
            warn!(task = %id, error = %e, "task book out of step");
        }
    }

    /// Resolve the caller tier, falling back to the free tier on error or timeout.
    async fn resolve_tier(&self, caller: &str) -> Tier {
        let limit = Duration::from_millis(self.config.resolver_timeout_ms);
        match timeout(limit, self.resolver.resolve(caller)).await {
            Ok(Ok(tier)) => tier,
            Ok(Err(e)) => {
                warn!(caller, error = %e, "tier resolution failed; using free tier");
                Tier::free()
            }
            Err(_) => {
                warn!(caller, timeout_ms = self.config.resolver_timeout_ms, "tier resolution timed out; using free tier");
                Tier::free()
            }
        }
    }

    async fn execute(&self, task: &Task) -> TaskOutput {
        let request = GenerationRequest::for_task(task);
        let generator = Arc::clone(&self.generator);
        let work: Work = Box::pin(async move { generator.generate(request).await });

        let limit_ms = self.config.generator_timeout_ms;
        let started = Instant::now();
        let result = match timeout(Duration::from_millis(limit_ms), self.executor.submit(work)).await {
            Ok(r) => r,
            Err(_) => Err(CollaboratorError::Timeout { ms: limit_ms }),
        };
        let elapsed = started.elapsed().as_millis() as u64;

        let outcome = match &result {
            Ok(_) => GenerationOutcome::Success,
            Err(CollaboratorError::Timeout { .. }) => GenerationOutcome::Timeout,
            Err(CollaboratorError::Panicked(_)) => GenerationOutcome::Panicked,
            Err(_) => GenerationOutcome::Failure,
        };
        self.ctx.metrics().record_generation(outcome, elapsed);

        match result {
            Ok(text) => {
                self.adjust_reputation(REPUTATION_GAIN);
                TaskOutput::Generated { text }
            }
            Err(e) => {
                let reputation = self.adjust_reputation(-REPUTATION_LOSS);
                warn!(
                    generator = self.generator.name(),
                    executor = self.executor.name(),
                    error = %e,
                    reputation,
                    "generation failed"
                );
                TaskOutput::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn dispatch(
        &self,
        task: &Task,
        request: &FulfillmentRequest,
        score: f64,
        vip: bool,
    ) -> Option<String> {
        let fulfillment = self.fulfillment.as_ref()?;
        let order_id = request.order_id_for(&task.id);
        let limit = Duration::from_millis(self.config.fulfillment_timeout_ms);
        match timeout(limit, fulfillment.dispatch(&task.id, &order_id, request, score, vip)).await {
            Ok(Ok(delivery)) => {
                debug!(order = %order_id, delivery = %delivery, "fulfillment dispatched");
                Some(delivery)
            }
            Ok(Err(e)) => {
                warn!(order = %order_id, error = %e, "fulfillment failed");
                None
            }
            Err(_) => {
                warn!(order = %order_id, "fulfillment timed out");
                None
            }
        }
    }

}

/// Slots held by an in-flight task; returned to their region on drop, so a cancelled
/// `process` call does not leak them.
struct SlotLease {
    scheduler: Arc<ClusterScheduler>,
    allocation: AllocationResult,
}

impl SlotLease {
    fn new(scheduler: Arc<ClusterScheduler>, allocation: AllocationResult) -> Self {
        Self {
            scheduler,
            allocation,
        }
    }
}

impl Drop for SlotLease {
    fn drop(&mut self) {
        if let Err(e) = self.scheduler.release(&self.allocation) {
            warn!(region = %self.allocation.region_id, error = %e, "release failed");
        }
    }
}

fn respond(
    task_id: &TaskId,
    score: RarityScore,
    tier: String,
    started: Instant,
    outcome: ProcessOutcome,
) -> ProcessResponse {
    ProcessResponse {
        task_id: task_id.clone(),
        score,
        tier,
        elapsed_ms: started.elapsed().as_millis() as u64,
        outcome,
    }
}
