//! Core type definitions for sectionsync.
//!
//! This crate defines the small, dependency-light types shared by every layer
//! of the pipeline:
//! - The [`Record`] trait and its identity contract
//! - Record and subscription identifiers
//! - Change operations delivered by a data source
//! - Index paths addressing a record inside a sectioned snapshot
//! - [`Document`], a ready-made JSON-backed record

mod document;
mod ids;
mod index_path;
mod operation;
mod record;

pub use document::Document;
pub use ids::{RecordId, SubscriptionId};
pub use index_path::IndexPath;
pub use operation::{Operation, OperationKind};
pub use record::Record;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
