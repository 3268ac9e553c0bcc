use crate::parallel::PoolState;
use thiserror::Error;

/// Errors raised synchronously by pool operations.
///
/// Callback failures never surface here; they are contained inside the
/// worker threads and reported through logging.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Cannot {operation} while pool is {state}")]
    InvalidState {
        operation: &'static str,
        state: PoolState,
    },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Failed to spawn worker thread {worker_id}: {source}")]
    Spawn {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },
}

impl PoolError {
    pub(crate) fn invalid_state(operation: &'static str, state: PoolState) -> Self {
        PoolError::InvalidState { operation, state }
    }
}

/// Errors raised when a callback reads its arguments from a [`WorkItem`].
///
/// [`WorkItem`]: crate::parallel::WorkItem
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Expected a positional argument, got named arguments")]
    ExpectedPositional,
    #[error("Expected named arguments, got a positional argument")]
    ExpectedNamed,
    #[error("Missing named argument `{0}`")]
    Missing(String),
}
