//! Change operations reported by a data source.
//!
//! A data source describes every change to the records matching a query as
//! one of three record-level operations. Operations carry the full record
//! value; there is no field-level patching.

use crate::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a change, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// The record started matching the query.
    Insert,
    /// The record's content changed.
    Update,
    /// The record stopped matching the query or was deleted.
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A single change to a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation<R> {
    Insert(R),
    Update(R),
    Delete(R),
}

impl<R> Operation<R> {
    /// Pairs a record with an operation kind.
    pub fn new(kind: OperationKind, record: R) -> Self {
        match kind {
            OperationKind::Insert => Self::Insert(record),
            OperationKind::Update => Self::Update(record),
            OperationKind::Delete => Self::Delete(record),
        }
    }

    /// Returns the kind of this operation.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Insert(_) => OperationKind::Insert,
            Self::Update(_) => OperationKind::Update,
            Self::Delete(_) => OperationKind::Delete,
        }
    }

    /// Returns the record carried by this operation.
    pub fn record(&self) -> &R {
        match self {
            Self::Insert(r) | Self::Update(r) | Self::Delete(r) => r,
        }
    }

    /// Consumes the operation, returning its record.
    pub fn into_record(self) -> R {
        match self {
            Self::Insert(r) | Self::Update(r) | Self::Delete(r) => r,
        }
    }
}

impl<R: Record> Operation<R> {
    /// Returns the identity of the record carried by this operation.
    pub fn id(&self) -> R::Id {
        self.record().id()
    }
}
