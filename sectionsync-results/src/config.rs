//! Filter, sort and section rules for a result set.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether a record belongs in the result set.
pub type Predicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// Strict-weak "comes before" relation between two records.
pub type Precedes<R> = Arc<dyn Fn(&R, &R) -> bool + Send + Sync>;

/// Derives a record's section key. `None` places it in the unnamed section.
pub type SectionKeyFn<R> = Arc<dyn Fn(&R) -> Option<String> + Send + Sync>;

/// Strict "comes before" relation between two section keys.
pub type SectionPrecedes = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// The rules a [`SectionedResultSet`](crate::SectionedResultSet) maintains.
///
/// Every rule has a default: include everything, keep insertion order,
/// put all records in one unnamed section, order sections lexicographically.
/// `order` must be a strict weak ordering and `section_order` a strict total
/// order over distinct keys.
pub struct Configuration<R> {
    include: Predicate<R>,
    order: Precedes<R>,
    section_key: SectionKeyFn<R>,
    section_order: SectionPrecedes,
}

impl<R: 'static> Configuration<R> {
    /// Creates a configuration with all defaults.
    pub fn new() -> Self {
        Self {
            include: Arc::new(|_: &R| true),
            order: Arc::new(|_: &R, _: &R| false),
            section_key: Arc::new(|_: &R| None),
            section_order: Arc::new(|a: &str, b: &str| a < b),
        }
    }

    /// Only records for which `include` returns true are kept.
    #[must_use]
    pub fn with_filter(mut self, include: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.include = Arc::new(include);
        self
    }

    /// Orders records within a section. `order(a, b)` returns true when `a`
    /// comes before `b`.
    #[must_use]
    pub fn with_order(mut self, order: impl Fn(&R, &R) -> bool + Send + Sync + 'static) -> Self {
        self.order = Arc::new(order);
        self
    }

    /// Orders records within a section by an `Ord` comparison.
    #[must_use]
    pub fn with_ordering(
        self,
        compare: impl Fn(&R, &R) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.with_order(move |a, b| compare(a, b) == Ordering::Less)
    }

    /// Orders records within a section by an extracted key.
    #[must_use]
    pub fn with_sort_key<K: Ord + 'static>(
        self,
        key: impl Fn(&R) -> K + Send + Sync + 'static,
    ) -> Self {
        self.with_order(move |a, b| key(a) < key(b))
    }

    /// Splits records into sections by the returned key.
    #[must_use]
    pub fn with_section_key(
        mut self,
        section_key: impl Fn(&R) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.section_key = Arc::new(section_key);
        self
    }

    /// Orders sections. `order(a, b)` returns true when section `a` comes
    /// before section `b`.
    #[must_use]
    pub fn with_section_order(
        mut self,
        order: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.section_order = Arc::new(order);
        self
    }

    /// Returns true if the record passes the filter.
    pub fn includes(&self, record: &R) -> bool {
        (self.include)(record)
    }

    /// Returns true if `a` sorts before `b` within a section.
    pub fn precedes(&self, a: &R, b: &R) -> bool {
        (self.order)(a, b)
    }

    /// The record's section key; the unnamed section is the empty string.
    pub fn section_key(&self, record: &R) -> String {
        (self.section_key)(record).unwrap_or_default()
    }

    /// Returns true if section `a` sorts before section `b`.
    pub fn section_precedes(&self, a: &str, b: &str) -> bool {
        (self.section_order)(a, b)
    }

    /// Global order of the flattened result list: section order first, then
    /// record order inside the same section.
    pub fn flat_precedes(&self, a: &R, b: &R) -> bool {
        let ka = self.section_key(a);
        let kb = self.section_key(b);
        if ka == kb {
            self.precedes(a, b)
        } else {
            self.section_precedes(&ka, &kb)
        }
    }
}

impl<R: 'static> Default for Configuration<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for Configuration<R> {
    fn clone(&self) -> Self {
        Self {
            include: Arc::clone(&self.include),
            order: Arc::clone(&self.order),
            section_key: Arc::clone(&self.section_key),
            section_order: Arc::clone(&self.section_order),
        }
    }
}

impl<R> fmt::Debug for Configuration<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration").finish_non_exhaustive()
    }
}
