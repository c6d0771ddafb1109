mod error;
pub use error::{ExecError, ExecResult};

mod metrics;
pub use metrics::collaborator_error_to_outcome;
pub use metrics::{EXECUTOR_TYPE_INLINE, EXECUTOR_TYPE_POOLED};

mod pool;
pub use pool::{InlineExecutor, PooledExecutor};

mod builtin;
pub use builtin::{EchoGenerator, LoggingFulfillment};

pub mod wire;
pub use wire::{HandshakeServer, TcpPeerConnector};
