//! Issued queries and the data-source seam.
//!
//! A [`Query`] is the only thing a data source sees of the controller. It
//! carries a frozen copy of the fetch request and forwards whatever the data
//! source reports into the controller's batch aggregator. Once the controller
//! supersedes a query, everything the data source does with it is ignored.

use crate::error::{QueryError, QueryResult};
use crate::request::FetchRequest;
use crate::resolve::ResolveOnce;
use sectionsync_batch::AggregatorHandle;
use sectionsync_types::{OperationKind, Record, SubscriptionId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Supplies records for queries issued by a results controller.
///
/// `execute` must eventually enqueue the query's results, at least once,
/// possibly with an empty list. It may keep the query and report later
/// changes through it until `stop` is called for it.
pub trait DataSource<R: Record>: Send + Sync {
    /// Starts answering `query`.
    fn execute(&self, query: Query<R>);

    /// Stops calling back into `query`.
    fn stop(&self, query: &Query<R>);
}

/// A rejection on its way to the controller.
#[derive(Debug)]
pub(crate) struct Rejection {
    pub(crate) subscription: SubscriptionId,
    pub(crate) error: QueryError,
}

struct QueryInner<R: Record> {
    request: FetchRequest<R>,
    subscription: SubscriptionId,
    aggregator: AggregatorHandle<R>,
    rejections: mpsc::UnboundedSender<Rejection>,
    stopped: AtomicBool,
    outcome: ResolveOnce<Result<(), QueryError>>,
}

/// Handle to one issued fetch. Cheap to clone and safe to use from any thread.
pub struct Query<R: Record> {
    inner: Arc<QueryInner<R>>,
}

impl<R: Record> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Record> Query<R> {
    pub(crate) fn new(
        request: FetchRequest<R>,
        subscription: SubscriptionId,
        aggregator: AggregatorHandle<R>,
        rejections: mpsc::UnboundedSender<Rejection>,
    ) -> Self {
        Self {
            inner: Arc::new(QueryInner {
                request,
                subscription,
                aggregator,
                rejections,
                stopped: AtomicBool::new(false),
                outcome: ResolveOnce::new(),
            }),
        }
    }

    /// The request as it was when the fetch was issued.
    pub fn request(&self) -> &FetchRequest<R> {
        &self.inner.request
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.inner.subscription
    }

    /// Reports records for this query. Ignored once the query is stopped.
    pub fn enqueue(&self, records: Vec<R>, kind: OperationKind) -> QueryResult<()> {
        if self.is_stopped() {
            trace!(
                "Ignoring {} {} record(s) for stopped {}",
                records.len(),
                kind,
                self.inner.subscription
            );
            return Ok(());
        }
        self.inner
            .aggregator
            .enqueue(self.inner.subscription, records, kind)?;
        Ok(())
    }

    /// Delivers everything enqueued so far without waiting for quiescence.
    pub fn process_pending_changes(&self) -> QueryResult<()> {
        if self.is_stopped() {
            return Ok(());
        }
        self.inner.aggregator.force_flush(self.inner.subscription)?;
        Ok(())
    }

    /// Marks the query as successfully answered.
    pub fn resolve(&self) -> QueryResult<()> {
        self.inner.outcome.set(Ok(()))
    }

    /// Fails the query. The controller reports the failure unless the query
    /// has been superseded.
    pub fn reject(&self, reason: impl Into<String>) -> QueryResult<()> {
        let error = QueryError::Rejected(reason.into());
        self.inner.outcome.set(Err(error.clone()))?;

        if self.is_stopped() {
            return Ok(());
        }
        warn!("{} rejected: {}", self.inner.subscription, error);
        // A closed channel means the controller is gone; nobody is left to
        // tell.
        let _ = self.inner.rejections.send(Rejection {
            subscription: self.inner.subscription,
            error,
        });
        Ok(())
    }

    /// The query's outcome, once resolved or rejected.
    pub fn outcome(&self) -> Option<&Result<(), QueryError>> {
        self.inner.outcome.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.outcome.is_resolved()
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Stops the query and drops whatever it has pending in the aggregator.
    pub(crate) fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.inner.aggregator.cancel(self.inner.subscription) {
            trace!("Cancel of {} skipped: {}", self.inner.subscription, e);
        }
    }
}

impl<R: Record> fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("subscription", &self.inner.subscription)
            .field("request", &self.inner.request)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
