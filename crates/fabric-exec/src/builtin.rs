//! Built-in collaborators for running a node without external services.
use std::time::Duration;

use async_trait::async_trait;
use fabric_core::{
    error::CollaboratorError,
    ports::{Fulfillment, Generator},
    region::haversine_km,
};
use fabric_model::{FulfillmentRequest, GenerationRequest, TaskId};
use tracing::{debug, info};

/// Generator that answers with the prompt it was given, after an optional delay.
#[derive(Debug, Default, Clone)]
pub struct EchoGenerator {
    delay: Option<Duration>,
}

impl EchoGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate generation latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        debug!(task = %request.task_id, max_tokens = request.max_tokens, "echo generation");
        let text: String = request
            .prompt
            .split_whitespace()
            .take(request.max_tokens as usize)
            .collect::<Vec<_>>()
            .join(" ");
        Ok(text)
    }
}

/// Fulfillment that accepts every order and only logs it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingFulfillment;

#[async_trait]
impl Fulfillment for LoggingFulfillment {
    async fn dispatch(
        &self,
        task_id: &TaskId,
        order_id: &str,
        request: &FulfillmentRequest,
        score: f64,
        vip: bool,
    ) -> Result<String, CollaboratorError> {
        let distance_km = haversine_km(request.pickup, request.dropoff);
        info!(
            task = %task_id,
            order = order_id,
            distance_km,
            weight_kg = request.package_weight_kg,
            score,
            vip,
            "fulfillment accepted"
        );
        Ok(format!("dispatch_{order_id}"))
    }
}
