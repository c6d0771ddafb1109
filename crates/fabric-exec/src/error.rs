use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid executor configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid peer address: {0}")]
    InvalidAddress(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wire codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("peer message exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("peer closed the connection")]
    Closed,
}

pub type ExecResult<T> = Result<T, ExecError>;
