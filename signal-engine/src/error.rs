// Engine error taxonomy
// Malformed snapshots never reach this level; evaluators degrade locally

use thiserror::Error;

/// Fatal engine errors. `Configuration` aborts startup or a hot reload
/// before any cycle runs with the bad values; `StateConsistency` aborts
/// the current cycle before it mutates tracked state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("state consistency violation: {0}")]
    StateConsistency(String),
}

impl EngineError {
    pub fn config(msg: impl Into<String>) -> Self {
        EngineError::Configuration(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        EngineError::StateConsistency(msg.into())
    }
}
