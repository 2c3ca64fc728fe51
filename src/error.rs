use thiserror::Error;

/// Errors surfaced by the optimization chain. Everything else degrades to a rejected step.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("initial state fails constraints: {}", failed.join(", "))]
    InvalidInitialState { failed: Vec<String> },

    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
