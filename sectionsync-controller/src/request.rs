//! What to fetch and how to present it.

use sectionsync_results::Configuration;
use std::cmp::Ordering;
use std::fmt;

/// A fetch request: the result-set rules plus an optional result limit.
///
/// The controller clones the request when a fetch is issued, so changing a
/// request afterwards never affects a query already in flight.
///
/// ```
/// use sectionsync_controller::FetchRequest;
/// use sectionsync_types::Document;
///
/// let request = FetchRequest::<Document>::new()
///     .filter(|d| d.kind == "task")
///     .sort_by_key(|d| d.number("/priority").map(|p| p as i64))
///     .section_by(|d| d.section_key("/list"))
///     .with_limit(50);
/// assert_eq!(request.limit(), 50);
/// ```
pub struct FetchRequest<R> {
    configuration: Configuration<R>,
    limit: usize,
}

impl<R: 'static> FetchRequest<R> {
    /// A request for every record, unsorted, in one section, unlimited.
    pub fn new() -> Self {
        Self::from_configuration(Configuration::new())
    }

    /// A request with prebuilt result-set rules.
    pub fn from_configuration(configuration: Configuration<R>) -> Self {
        Self {
            configuration,
            limit: 0,
        }
    }

    #[must_use]
    pub fn filter(mut self, include: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.configuration = self.configuration.with_filter(include);
        self
    }

    /// Orders records within a section by an `Ord` comparison.
    #[must_use]
    pub fn sort_by(
        mut self,
        compare: impl Fn(&R, &R) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.configuration = self.configuration.with_ordering(compare);
        self
    }

    #[must_use]
    pub fn sort_by_key<K: Ord + 'static>(
        mut self,
        key: impl Fn(&R) -> K + Send + Sync + 'static,
    ) -> Self {
        self.configuration = self.configuration.with_sort_key(key);
        self
    }

    /// Groups records into sections by the returned key.
    #[must_use]
    pub fn section_by(
        mut self,
        section_key: impl Fn(&R) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.configuration = self.configuration.with_section_key(section_key);
        self
    }

    #[must_use]
    pub fn section_order_by(
        mut self,
        order: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.configuration = self.configuration.with_section_order(order);
        self
    }

    /// Keeps at most `limit` records, the first ones in global order. Zero
    /// means unlimited.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Returns true if the record passes the request's filter.
    pub fn includes(&self, record: &R) -> bool {
        self.configuration.includes(record)
    }
}

impl<R> FetchRequest<R> {
    pub fn configuration(&self) -> &Configuration<R> {
        &self.configuration
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl<R: 'static> Default for FetchRequest<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for FetchRequest<R> {
    fn clone(&self) -> Self {
        Self {
            configuration: self.configuration.clone(),
            limit: self.limit,
        }
    }
}

impl<R> fmt::Debug for FetchRequest<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
