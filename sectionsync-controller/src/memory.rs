//! An in-memory data source.

use crate::error::QueryResult;
use crate::query::{DataSource, Query};
use sectionsync_types::{OperationKind, Record};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

struct MemoryState<R: Record> {
    /// Stored records in insertion order.
    records: Vec<R>,
    /// Queries that receive live changes.
    live: Vec<Query<R>>,
    /// Reason the next `execute` fails with, if set.
    fail_next: Option<String>,
}

/// A record store that answers queries from memory and pushes later changes
/// to every live query.
///
/// Records are matched against each query's own frozen request, so queries
/// with different filters can be live at the same time.
pub struct MemoryDataSource<R: Record> {
    state: RwLock<MemoryState<R>>,
}

impl<R: Record> MemoryDataSource<R> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Creates a store pre-filled with `records`.
    pub fn with_records(records: Vec<R>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                records,
                live: Vec::new(),
                fail_next: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState<R>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState<R>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of every stored record.
    pub fn records(&self) -> Vec<R> {
        self.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    /// Number of queries currently receiving live changes.
    pub fn live_queries(&self) -> usize {
        self.read().live.len()
    }

    /// Makes the next `execute` reject its query with `reason`.
    pub fn fail_next(&self, reason: impl Into<String>) {
        self.write().fail_next = Some(reason.into());
    }

    /// Stores a record, replacing one with the same identity, and reports it
    /// to every live query whose filter accepts it.
    pub fn insert(&self, record: R) -> QueryResult<()> {
        let live = {
            let mut state = self.write();
            store(&mut state.records, record.clone());
            state.live.clone()
        };
        for query in live.iter().filter(|q| q.request().includes(&record)) {
            query.enqueue(vec![record.clone()], OperationKind::Insert)?;
        }
        Ok(())
    }

    /// Replaces a stored record and reports the change to every live query.
    ///
    /// A query whose filter no longer accepts the record receives a delete.
    pub fn update(&self, record: R) -> QueryResult<()> {
        let live = {
            let mut state = self.write();
            store(&mut state.records, record.clone());
            state.live.clone()
        };
        for query in &live {
            let kind = if query.request().includes(&record) {
                OperationKind::Update
            } else {
                OperationKind::Delete
            };
            query.enqueue(vec![record.clone()], kind)?;
        }
        Ok(())
    }

    /// Removes the record with this identity. Returns the stored value, if
    /// there was one.
    pub fn delete(&self, id: &R::Id) -> QueryResult<Option<R>> {
        let (removed, live) = {
            let mut state = self.write();
            let removed = state
                .records
                .iter()
                .position(|r| r.id() == *id)
                .map(|index| state.records.remove(index));
            (removed, state.live.clone())
        };
        if let Some(record) = &removed {
            for query in &live {
                query.enqueue(vec![record.clone()], OperationKind::Delete)?;
            }
        }
        Ok(removed)
    }
}

fn store<R: Record>(records: &mut Vec<R>, record: R) {
    let id = record.id();
    match records.iter_mut().find(|r| r.id() == id) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

impl<R: Record> Default for MemoryDataSource<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> DataSource<R> for MemoryDataSource<R> {
    fn execute(&self, query: Query<R>) {
        let (failure, matching) = {
            let mut state = self.write();
            match state.fail_next.take() {
                Some(reason) => (Some(reason), Vec::new()),
                None => {
                    let matching: Vec<R> = state
                        .records
                        .iter()
                        .filter(|r| query.request().includes(r))
                        .cloned()
                        .collect();
                    state.live.retain(|q| !q.is_stopped());
                    state.live.push(query.clone());
                    (None, matching)
                }
            }
        };

        if let Some(reason) = failure {
            if let Err(e) = query.reject(reason) {
                debug!("Could not reject {}: {}", query.subscription(), e);
            }
            return;
        }

        debug!(
            "Executing {} against {} record(s), {} match",
            query.subscription(),
            self.len(),
            matching.len()
        );
        let outcome = query
            .enqueue(matching, OperationKind::Insert)
            .and_then(|()| query.resolve());
        if let Err(e) = outcome {
            debug!("Could not answer {}: {}", query.subscription(), e);
        }
    }

    fn stop(&self, query: &Query<R>) {
        self.write()
            .live
            .retain(|q| q.subscription() != query.subscription());
    }
}
