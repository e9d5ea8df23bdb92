//! Error types for the serving layer.

use thiserror::Error;

/// Errors surfaced by the recommendation engine and its loader.
///
/// `Clone` so a single failed load can be handed to every request that was
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not be built (missing or invalid artifacts, storage errors)
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    /// Scoring or filtering failed for a single request
    #[error("Recommendation failed: {0}")]
    Computation(String),
}

impl EngineError {
    /// The message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            EngineError::Unavailable(msg) | EngineError::Computation(msg) => msg,
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EngineError>;
