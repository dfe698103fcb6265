//! Error types for the batching layer.

use thiserror::Error;

/// Result type for batching operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that can occur while talking to an aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// The aggregator task has shut down and no longer accepts commands.
    #[error("aggregator closed")]
    AggregatorClosed,
}
