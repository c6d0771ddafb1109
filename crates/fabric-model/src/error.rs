use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown priority class: {0}")]
    UnknownPriority(String),

    #[error("unknown tier rank: {0}")]
    UnknownTierRank(String),

    #[error("unknown jitter strategy: {0}")]
    UnknownJitter(String),

    #[error("illegal task transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
