use async_trait::async_trait;
use fabric_core::{
    error::CollaboratorError,
    ports::{Executor, Work},
};

use crate::metrics::EXECUTOR_TYPE_INLINE;

/// Polls work on the caller's task. Panics unwind into the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

#[async_trait]
impl Executor for InlineExecutor {
    fn name(&self) -> &'static str {
        EXECUTOR_TYPE_INLINE
    }

    async fn submit(&self, work: Work) -> Result<String, CollaboratorError> {
        work.await
    }
}
