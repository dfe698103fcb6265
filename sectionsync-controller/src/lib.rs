//! Fetch lifecycle for sectionsync.
//!
//! A [`ResultsController`] keeps a sectioned snapshot of a [`DataSource`]'s
//! records current and tells its consumer what changed:
//!
//! 1. [`ResultsController::perform_fetch`] issues a [`Query`] carrying a
//!    frozen copy of the [`FetchRequest`]
//! 2. the data source reports records through the query; they are batched by
//!    a [`BatchAggregator`](sectionsync_batch::BatchAggregator)
//! 3. [`ResultsController::next_update`] applies each flushed digest, diffs
//!    the old snapshot against the new one and returns the
//!    [`ChangeSet`](sectionsync_results::ChangeSet)
//!
//! A new fetch supersedes the previous one; its late results are dropped.
//!
//! # Example
//!
//! ```
//! use sectionsync_controller::{
//!     ControllerConfig, FetchRequest, MemoryDataSource, ResultsController, Update,
//! };
//! use sectionsync_types::Document;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let source = Arc::new(MemoryDataSource::with_records(vec![
//!     Document::new("task", json!({ "list": "inbox", "title": "Write docs" })),
//!     Document::new("task", json!({ "list": "later", "title": "Ship it" })),
//! ]));
//! let mut controller = ResultsController::new(source.clone(), ControllerConfig::default());
//!
//! controller.perform_fetch(
//!     &FetchRequest::new().section_by(|d: &Document| d.section_key("/list")),
//! );
//! let Some(Update::Changed(changes)) = controller.next_update().await else {
//!     panic!("expected results");
//! };
//! assert_eq!(changes.inserted_sections.len(), 2);
//! assert_eq!(controller.sections()[0].name, "inbox");
//! # }
//! ```

mod controller;
mod error;
mod memory;
mod observer;
mod query;
mod request;
mod resolve;
mod state;

pub use controller::{ControllerConfig, ResultsController, Update};
pub use error::{ControllerError, ControllerResult, QueryError, QueryResult};
pub use memory::MemoryDataSource;
pub use observer::ResultsObserver;
pub use query::{DataSource, Query};
pub use request::FetchRequest;
pub use resolve::ResolveOnce;
pub use state::FetchState;
