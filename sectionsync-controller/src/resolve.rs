//! Single-assignment completion cell.

use crate::error::{QueryError, QueryResult};
use std::sync::OnceLock;

/// A value that can be written exactly once.
///
/// Writers race freely; the first `set` wins and every later one fails with
/// [`QueryError::AlreadyResolved`].
#[derive(Debug)]
pub struct ResolveOnce<T> {
    cell: OnceLock<T>,
}

impl<T> ResolveOnce<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Stores `value` if nothing was stored before.
    pub fn set(&self, value: T) -> QueryResult<()> {
        self.cell.set(value).map_err(|_| QueryError::AlreadyResolved)
    }

    /// The stored value, if any.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Default for ResolveOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}
