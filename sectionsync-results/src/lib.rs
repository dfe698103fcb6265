//! Sectioned result sets for sectionsync.
//!
//! This crate holds the two pure halves of a synchronization cycle:
//!
//! - [`SectionedResultSet`]: a filtered, sorted, sectioned snapshot that
//!   applies a [`Digest`](sectionsync_batch::Digest) to itself while keeping
//!   its ordering invariants
//! - [`diff`]: compares two snapshots and classifies every change as a
//!   section insert/remove or a row insert/remove/update/move
//!
//! Both are synchronous and free of I/O. A snapshot handed to [`diff`] is only
//! read, so diffing may run on any thread.
//!
//! # Example
//!
//! ```
//! use sectionsync_batch::Digest;
//! use sectionsync_results::{diff, Configuration, SectionedResultSet};
//! use sectionsync_types::{Document, IndexPath};
//! use serde_json::json;
//!
//! let config = Configuration::<Document>::new()
//!     .with_section_key(|d| d.section_key("/list"));
//!
//! let old = SectionedResultSet::new(config);
//! let mut new = old.clone();
//! new.apply(&Digest::inserting(vec![Document::new("task", json!({ "list": "inbox" }))]), 0);
//!
//! let changes = diff(&old, &new, &[]);
//! assert_eq!(changes.inserted_sections.len(), 1);
//! assert_eq!(changes.inserted[0].path, IndexPath::new(0, 0));
//! ```

mod config;
mod diff;
mod result_set;
mod section;
pub mod sequence_diff;

pub use config::Configuration;
pub use diff::{diff, Change, ChangeSet, RowChange, RowMove, SectionChange};
pub use result_set::{ApplyStats, SectionedResultSet};
pub use section::{Section, SectionInfo};
