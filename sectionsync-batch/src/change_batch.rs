//! Per-cycle bag of pending operations.
//!
//! A `ChangeBatch` keeps at most one pending record per identity for each
//! operation kind. Conflicts between kinds are only resolved when the batch
//! is flushed, so the order in which a data source reports an insert and a
//! later delete of the same record does not matter within one cycle.

use sectionsync_types::{Operation, OperationKind, Record};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// The resolved net effect of a batch.
///
/// The three lists are disjoint by identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Digest<R> {
    pub inserted: Vec<R>,
    pub updated: Vec<R>,
    pub deleted: Vec<R>,
}

impl<R> Digest<R> {
    /// Creates a digest with no changes.
    pub fn empty() -> Self {
        Self {
            inserted: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// Creates a digest that only inserts the given records.
    pub fn inserting(records: Vec<R>) -> Self {
        Self {
            inserted: records,
            ..Self::empty()
        }
    }

    /// Returns true if the digest carries no changes.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Total number of records across all three lists.
    pub fn len(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.deleted.len()
    }
}

impl<R> Default for Digest<R> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Pending records of one kind, keyed by identity.
///
/// Each entry remembers the sequence number of its first enqueue so the
/// flushed lists come out in a deterministic order.
struct Pending<R: Record> {
    entries: HashMap<R::Id, (u64, R)>,
}

impl<R: Record> Pending<R> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn put(&mut self, seq: u64, record: R) {
        match self.entries.entry(record.id()) {
            Entry::Occupied(mut slot) => slot.get_mut().1 = record,
            Entry::Vacant(slot) => {
                slot.insert((seq, record));
            }
        }
    }

    fn contains(&self, id: &R::Id) -> bool {
        self.entries.contains_key(id)
    }

    fn into_sorted(self) -> Vec<R> {
        let mut entries: Vec<(u64, R)> = self.entries.into_values().collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, record)| record).collect()
    }
}

/// Pending insert/update/delete operations for one subscription.
pub struct ChangeBatch<R: Record> {
    inserts: Pending<R>,
    updates: Pending<R>,
    deletes: Pending<R>,
    /// Monotonic enqueue counter.
    seq: u64,
}

impl<R: Record> ChangeBatch<R> {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self {
            inserts: Pending::new(),
            updates: Pending::new(),
            deletes: Pending::new(),
            seq: 0,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Records a pending insertion, replacing any earlier pending insertion
    /// of the same record.
    pub fn insert(&mut self, record: R) {
        let seq = self.next_seq();
        self.inserts.put(seq, record);
    }

    /// Records a pending update, replacing any earlier pending update of the
    /// same record.
    pub fn update(&mut self, record: R) {
        let seq = self.next_seq();
        self.updates.put(seq, record);
    }

    /// Records a pending deletion, replacing any earlier pending deletion of
    /// the same record.
    pub fn delete(&mut self, record: R) {
        let seq = self.next_seq();
        self.deletes.put(seq, record);
    }

    /// Records a single operation.
    pub fn push(&mut self, operation: Operation<R>) {
        match operation {
            Operation::Insert(r) => self.insert(r),
            Operation::Update(r) => self.update(r),
            Operation::Delete(r) => self.delete(r),
        }
    }

    /// Records the same operation kind for every record.
    pub fn extend(&mut self, records: impl IntoIterator<Item = R>, kind: OperationKind) {
        for record in records {
            self.push(Operation::new(kind, record));
        }
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending_len() == 0
    }

    /// Number of pending entries across all kinds, before resolution.
    pub fn pending_len(&self) -> usize {
        self.inserts.entries.len() + self.updates.entries.len() + self.deletes.entries.len()
    }

    /// Clears all pending state.
    pub fn reset(&mut self) {
        self.inserts.entries.clear();
        self.updates.entries.clear();
        self.deletes.entries.clear();
        self.seq = 0;
    }

    /// Resolves pending operations into a digest and empties the batch.
    ///
    /// - insert + delete of one record cancel out entirely
    /// - insert + update collapse into one insert of the updated value
    /// - update + delete collapse into the delete
    pub fn flush(&mut self) -> Digest<R> {
        let mut inserts = std::mem::replace(&mut self.inserts, Pending::new());
        let mut updates = std::mem::replace(&mut self.updates, Pending::new());
        let mut deletes = std::mem::replace(&mut self.deletes, Pending::new());
        self.seq = 0;

        let inserted_ids: Vec<R::Id> = inserts.entries.keys().cloned().collect();
        for id in inserted_ids {
            if deletes.contains(&id) {
                inserts.entries.remove(&id);
                updates.entries.remove(&id);
                deletes.entries.remove(&id);
            } else if let Some((_, newer)) = updates.entries.remove(&id) {
                if let Some(slot) = inserts.entries.get_mut(&id) {
                    slot.1 = newer;
                }
            }
        }

        updates.entries.retain(|id, _| !deletes.contains(id));

        Digest {
            inserted: inserts.into_sorted(),
            updated: updates.into_sorted(),
            deleted: deletes.into_sorted(),
        }
    }
}

impl<R: Record> Default for ChangeBatch<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> std::fmt::Debug for ChangeBatch<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBatch")
            .field("inserts", &self.inserts.entries.len())
            .field("updates", &self.updates.entries.len())
            .field("deletes", &self.deletes.entries.len())
            .finish()
    }
}
