//! Error types for queries and the results controller.

use sectionsync_batch::BatchError;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors raised on the data-source side of a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The data source could not run the query.
    #[error("query rejected: {0}")]
    Rejected(String),

    /// The query was resolved or rejected a second time.
    #[error("query already resolved")]
    AlreadyResolved,

    /// The batch aggregator behind the query has stopped.
    #[error("aggregator error: {0}")]
    Aggregator(#[from] BatchError),
}

/// Errors surfaced to the consumer of a results controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    /// No record lives at the requested index path.
    #[error("invalid index path: row {row} in section {section}")]
    InvalidIndexPath { row: usize, section: usize },

    /// The data source rejected the current query.
    #[error("query failure: {0}")]
    QueryFailure(#[from] QueryError),
}
