//! The fetch lifecycle.
//!
//! A `ResultsController` issues queries to a [`DataSource`], receives the
//! resulting digests from its batch aggregator, applies them to the current
//! snapshot and publishes what changed. The consumer drives delivery by
//! awaiting [`ResultsController::next_update`], so snapshot mutation, diffing
//! and notifications all happen on the consumer's task.
//!
//! Every fetch bumps a generation counter that doubles as the query's
//! subscription id. Flushes and rejections tagged with an older generation
//! are dropped on arrival.

use crate::error::{ControllerError, ControllerResult};
use crate::observer::ResultsObserver;
use crate::query::{DataSource, Query, Rejection};
use crate::request::FetchRequest;
use crate::state::FetchState;
use sectionsync_batch::{
    AggregatorConfig, AggregatorHandle, BatchAggregator, Flush, FlushReceiver,
};
use sectionsync_results::{diff, ChangeSet, SectionInfo, SectionedResultSet};
use sectionsync_types::{IndexPath, Record, SubscriptionId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Configuration for a results controller.
#[derive(Debug, Clone, Default)]
pub struct ControllerConfig {
    /// How change notifications are batched before they reach the snapshot.
    pub aggregator: AggregatorConfig,
}

/// One delivery from [`ResultsController::next_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum Update<R> {
    /// The snapshot changed.
    Changed(ChangeSet<R>),
    /// The current query failed; the snapshot is unchanged.
    Failed(ControllerError),
}

/// Keeps a sectioned snapshot in sync with a data source.
pub struct ResultsController<R: Record> {
    source: Arc<dyn DataSource<R>>,
    config: ControllerConfig,
    aggregator: AggregatorHandle<R>,
    flushes: FlushReceiver<R>,
    rejections_tx: mpsc::UnboundedSender<Rejection>,
    rejections: mpsc::UnboundedReceiver<Rejection>,
    /// Request of the most recent fetch.
    request: FetchRequest<R>,
    query: Option<Query<R>>,
    generation: u64,
    /// The next delivery starts from an empty snapshot.
    rebuild: bool,
    /// `will_change_content` was sent and its `did_change_content` is owed.
    content_pending: bool,
    current: SectionedResultSet<R>,
    state: FetchState,
    observers: Vec<Arc<dyn ResultsObserver<R>>>,
}

impl<R: Record> ResultsController<R> {
    /// Creates a controller and spawns its batch aggregator on the current
    /// tokio runtime.
    pub fn new(source: Arc<dyn DataSource<R>>, config: ControllerConfig) -> Self {
        let (aggregator, flushes) = BatchAggregator::spawn(config.aggregator.clone());
        let (rejections_tx, rejections) = mpsc::unbounded_channel();
        let request = FetchRequest::new();
        let current = SectionedResultSet::new(request.configuration().clone());

        Self {
            source,
            config,
            aggregator,
            flushes,
            rejections_tx,
            rejections,
            request,
            query: None,
            generation: 0,
            rebuild: false,
            content_pending: false,
            current,
            state: FetchState::Initial,
            observers: Vec::new(),
        }
    }

    /// Registers an observer for change notifications.
    pub fn add_observer(&mut self, observer: Arc<dyn ResultsObserver<R>>) {
        self.observers.push(observer);
    }

    // ── Fetching ─────────────────────────────────────────────────

    /// Starts a new fetch, superseding the previous one.
    ///
    /// The request is copied; later changes to `request` do not affect the
    /// issued query. Returns the new query's subscription id.
    ///
    /// Observers get `will_change_content` here. If the previous fetch never
    /// delivered, its announcement is closed with `did_change_content` first.
    pub fn perform_fetch(&mut self, request: &FetchRequest<R>) -> SubscriptionId {
        self.generation += 1;
        self.rebuild = true;
        let subscription = SubscriptionId::new(self.generation);
        debug!("Starting fetch {} (limit {})", subscription, request.limit());

        self.close_pending_content();
        for observer in &self.observers {
            observer.will_change_content();
        }
        self.content_pending = true;

        if let Some(previous) = self.query.take() {
            debug!("Stopping superseded {}", previous.subscription());
            previous.stop();
            self.source.stop(&previous);
        }

        self.request = request.clone();
        let query = Query::new(
            self.request.clone(),
            subscription,
            self.aggregator.clone(),
            self.rejections_tx.clone(),
        );
        self.query = Some(query.clone());
        self.state = FetchState::Loading;
        self.source.execute(query);

        subscription
    }

    // ── Delivery ─────────────────────────────────────────────────

    /// Waits for the next change or failure of the current fetch.
    ///
    /// Deliveries from superseded fetches, and incremental flushes that change
    /// nothing, are consumed silently. Returns `None` once the aggregator has
    /// stopped.
    pub async fn next_update(&mut self) -> Option<Update<R>> {
        loop {
            tokio::select! {
                biased;
                Some(rejection) = self.rejections.recv() => {
                    if let Some(update) = self.handle_rejection(rejection) {
                        return Some(update);
                    }
                }
                flush = self.flushes.recv() => {
                    if let Some(update) = self.handle_flush(flush?) {
                        return Some(update);
                    }
                }
            }
        }
    }

    /// Processes deliveries that are already waiting, without blocking.
    pub fn try_next_update(&mut self) -> Option<Update<R>> {
        while let Ok(rejection) = self.rejections.try_recv() {
            if let Some(update) = self.handle_rejection(rejection) {
                return Some(update);
            }
        }
        while let Ok(flush) = self.flushes.try_recv() {
            if let Some(update) = self.handle_flush(flush) {
                return Some(update);
            }
        }
        None
    }

    fn is_current(&self, subscription: SubscriptionId) -> bool {
        self.query
            .as_ref()
            .is_some_and(|q| q.subscription() == subscription)
    }

    fn handle_flush(&mut self, flush: Flush<R>) -> Option<Update<R>> {
        let Flush {
            subscription,
            digest,
        } = flush;
        if !self.is_current(subscription) {
            debug!("Discarding stale flush from {}", subscription);
            return None;
        }

        let rebuild = std::mem::take(&mut self.rebuild);
        let mut next = if rebuild {
            SectionedResultSet::new(self.request.configuration().clone())
        } else {
            self.current.clone()
        };
        next.apply(&digest, self.request.limit());

        let previous = std::mem::replace(&mut self.current, next);
        let changes = diff(&previous, &self.current, &digest.updated);
        self.state = FetchState::Loaded;

        if !rebuild && changes.is_empty() {
            return None;
        }

        if !std::mem::take(&mut self.content_pending) {
            for observer in &self.observers {
                observer.will_change_content();
            }
        }
        for observer in &self.observers {
            observer.did_change_results(&changes);
        }
        for observer in &self.observers {
            observer.did_change_content();
        }
        debug!(
            "{} delivered {} change(s), {} record(s) in {} section(s)",
            subscription,
            changes.len(),
            self.current.len(),
            self.current.sections().len()
        );
        Some(Update::Changed(changes))
    }

    fn handle_rejection(&mut self, rejection: Rejection) -> Option<Update<R>> {
        if !self.is_current(rejection.subscription) {
            debug!(
                "Discarding rejection from superseded {}",
                rejection.subscription
            );
            return None;
        }

        let error = ControllerError::QueryFailure(rejection.error);
        for observer in &self.observers {
            observer.did_fail(&error);
        }
        self.close_pending_content();
        Some(Update::Failed(error))
    }

    fn close_pending_content(&mut self) {
        if std::mem::take(&mut self.content_pending) {
            for observer in &self.observers {
                observer.did_change_content();
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    /// All fetched records in global order.
    pub fn fetched_objects(&self) -> &[R] {
        self.current.flat()
    }

    /// Section names and sizes in section order.
    pub fn sections(&self) -> Vec<SectionInfo> {
        self.current.section_infos()
    }

    /// The record at an index path.
    pub fn object(&self, path: IndexPath) -> ControllerResult<&R> {
        self.current
            .object(path)
            .ok_or(ControllerError::InvalidIndexPath {
                row: path.row,
                section: path.section,
            })
    }

    /// Where the record with this identity currently lives.
    pub fn index_path(&self, record: &R) -> Option<IndexPath> {
        self.current.index_path(record)
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Number of fetches performed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> &SectionedResultSet<R> {
        &self.current
    }

    /// The request of the most recent fetch.
    pub fn request(&self) -> &FetchRequest<R> {
        &self.request
    }

    /// The query of the most recent fetch, if any.
    pub fn query(&self) -> Option<&Query<R>> {
        self.query.as_ref()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

impl<R: Record> Drop for ResultsController<R> {
    fn drop(&mut self) {
        if let Some(query) = self.query.take() {
            query.stop();
            self.source.stop(&query);
        }
        if self.aggregator.shutdown().is_ok() {
            debug!("Results controller dropped after {} fetch(es)", self.generation);
        }
    }
}
