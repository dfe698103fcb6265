use std::fmt::Debug;
use std::hash::Hash;

/// A payload tracked by a sectioned result set.
///
/// The only requirement is a stable identity: two values with the same
/// [`Record::id`] describe the same record at different points in time,
/// whatever their content.
pub trait Record: Clone + Send + Sync + 'static {
    /// Identity type. Must stay constant for the lifetime of the record.
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Returns this record's identity.
    fn id(&self) -> Self::Id;
}
