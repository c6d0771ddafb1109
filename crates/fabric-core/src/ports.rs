//! Seams to the collaborators the core does not own.
//!
//! Adapters live outside the core; tests provide their own.
use std::{future::Future, pin::Pin};

use async_trait::async_trait;
use fabric_model::{FulfillmentRequest, GenerationRequest, PeerAck, PeerHello, TaskId, Tier};

use crate::error::CollaboratorError;

/// Boxed unit of work handed to an [`Executor`].
pub type Work = Pin<Box<dyn Future<Output = Result<String, CollaboratorError>> + Send + 'static>>;

/// Resolves a caller id into its entitlement tier.
#[async_trait]
pub trait TierResolver: Send + Sync + 'static {
    async fn resolve(&self, caller: &str) -> Result<Tier, CollaboratorError>;
}

/// Produces the text result of an admitted task. May be slow or fail.
#[async_trait]
pub trait Generator: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError>;
}

/// Dispatches a physical-delivery sub-request; returns a delivery reference.
#[async_trait]
pub trait Fulfillment: Send + Sync + 'static {
    async fn dispatch(
        &self,
        task_id: &TaskId,
        order_id: &str,
        request: &FulfillmentRequest,
        score: f64,
        vip: bool,
    ) -> Result<String, CollaboratorError>;
}

/// Runs units of work somewhere other than the caller's stack.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Run `work` to completion and return its output.
    ///
    /// Panics inside `work` surface as [`CollaboratorError::Panicked`].
    async fn submit(&self, work: Work) -> Result<String, CollaboratorError>;
}

/// Performs the peer handshake over some transport.
#[async_trait]
pub trait PeerConnector: Send + Sync + 'static {
    async fn handshake(&self, address: &str, hello: &PeerHello) -> Result<PeerAck, CollaboratorError>;
}
