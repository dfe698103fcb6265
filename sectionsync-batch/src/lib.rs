//! Change batching for sectionsync.
//!
//! Data sources report changes one operation at a time, often in bursts and
//! from several threads at once. This crate turns those bursts into
//! deduplicated [`Digest`]s:
//!
//! - [`ChangeBatch`] collects pending operations for one subscription and
//!   resolves conflicting operations on the same record when flushed.
//! - [`BatchAggregator`] owns one `ChangeBatch` per subscription inside a
//!   single task, debounces enqueues, and delivers a [`Flush`] per quiet
//!   period on a channel drained by the consumer.
//!
//! # Example
//!
//! ```
//! use sectionsync_batch::ChangeBatch;
//! use sectionsync_types::Document;
//! use serde_json::json;
//!
//! let note = Document::new("note", json!({ "title": "draft" }));
//! let mut batch = ChangeBatch::new();
//! batch.insert(note.clone());
//! batch.update(note.revised(json!({ "title": "final" })));
//!
//! let digest = batch.flush();
//! assert_eq!(digest.inserted.len(), 1);
//! assert!(digest.updated.is_empty());
//! ```

mod aggregator;
mod change_batch;
mod error;

pub use aggregator::{
    AggregatorConfig, AggregatorHandle, BatchAggregator, DEFAULT_QUIESCENCE, Flush, FlushReceiver,
};
pub use change_batch::{ChangeBatch, Digest};
pub use error::{BatchError, BatchResult};
