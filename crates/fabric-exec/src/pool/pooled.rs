use std::{any::Any, sync::Arc, thread};

use async_trait::async_trait;
use fabric_core::{
    error::CollaboratorError,
    ports::{Executor, Work},
};
use tokio::sync::Semaphore;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, trace};

use crate::{
    error::{ExecError, ExecResult},
    metrics::{EXECUTOR_TYPE_POOLED, collaborator_error_to_outcome},
};

/// Bounded worker pool on top of the tokio runtime.
///
/// At most `size` units run at once; further submissions wait for a permit. Each unit runs
/// on its own tokio task, so a panic is reported as [`CollaboratorError::Panicked`] instead
/// of unwinding into the caller. Dropping the `submit` future (e.g. on timeout) aborts the
/// unit and frees its permit.
#[derive(Debug)]
pub struct PooledExecutor {
    permits: Arc<Semaphore>,
    size: usize,
}

impl PooledExecutor {
    /// Create a pool with `size` workers.
    pub fn new(size: usize) -> ExecResult<Self> {
        if size == 0 {
            return Err(ExecError::InvalidConfig("worker pool size cannot be zero".into()));
        }
        Ok(Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        })
    }

    /// Pool sized to the host's available parallelism.
    pub fn with_available_parallelism() -> Self {
        let size = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Pool sized from the node configuration (`None` = available parallelism).
    pub fn from_workers(workers: Option<usize>) -> ExecResult<Self> {
        match workers {
            Some(n) => Self::new(n),
            None => Ok(Self::with_available_parallelism()),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits not currently held by running units.
    pub fn idle(&self) -> usize {
        self.permits.available_permits()
    }

    /// Refuse further submissions. Units already running finish normally.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}

#[async_trait]
impl Executor for PooledExecutor {
    fn name(&self) -> &'static str {
        EXECUTOR_TYPE_POOLED
    }

    async fn submit(&self, work: Work) -> Result<String, CollaboratorError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| CollaboratorError::Unavailable("worker pool is closed".into()))?;
        trace!(idle = self.idle(), size = self.size, "worker acquired");

        let handle = AbortOnDropHandle::new(tokio::spawn(async move {
            let _permit = permit;
            work.await
        }));

        let result = match handle.await {
            Ok(r) => r,
            Err(e) if e.is_panic() => Err(CollaboratorError::Panicked(panic_message(e.into_panic()))),
            Err(e) => Err(CollaboratorError::Failed(format!("worker cancelled: {e}"))),
        };
        if let Err(e) = &result {
            debug!(
                executor = EXECUTOR_TYPE_POOLED,
                outcome = collaborator_error_to_outcome(e).as_label(),
                error = %e,
                "work failed"
            );
        }
        result
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
