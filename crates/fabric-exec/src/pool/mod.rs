//! Executors that run generator work off the caller's stack.
mod inline;
mod pooled;

pub use inline::InlineExecutor;
pub use pooled::PooledExecutor;
