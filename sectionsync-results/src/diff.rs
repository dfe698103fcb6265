//! Classified change sets between two snapshots.
//!
//! [`diff`] compares an old and a new [`SectionedResultSet`] and reports what a
//! list UI has to do to get from one to the other: sections to insert and
//! remove, rows to insert, remove, reload in place, and move.

use crate::result_set::SectionedResultSet;
use crate::section::SectionInfo;
use crate::sequence_diff::{self, Edit};
use sectionsync_types::{IndexPath, Record};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A section inserted into or removed from the section list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionChange {
    /// Index in the new section list for inserts, the old one for removals.
    pub index: usize,
    pub section: SectionInfo,
}

/// A row inserted, removed or updated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowChange<R> {
    /// Path in the new snapshot for inserts, the old one for removals and
    /// updates.
    pub path: IndexPath,
    pub record: R,
}

/// A row whose identity survived but whose index path changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowMove<R> {
    /// Path in the old snapshot.
    pub from: IndexPath,
    /// Path in the new snapshot.
    pub to: IndexPath,
    /// The record's new value.
    pub record: R,
}

/// One entry of a change set, in application order.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<'a, R> {
    Update { path: IndexPath, record: &'a R },
    Remove { path: IndexPath, record: &'a R },
    RemoveSection { index: usize, section: &'a SectionInfo },
    InsertSection { index: usize, section: &'a SectionInfo },
    Insert { path: IndexPath, record: &'a R },
    Move { from: IndexPath, to: IndexPath, record: &'a R },
}

/// Everything that changed between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSet<R> {
    pub inserted_sections: Vec<SectionChange>,
    pub removed_sections: Vec<SectionChange>,
    pub inserted: Vec<RowChange<R>>,
    pub removed: Vec<RowChange<R>>,
    pub updated: Vec<RowChange<R>>,
    pub moved: Vec<RowMove<R>>,
}

impl<R> ChangeSet<R> {
    /// A change set with nothing in it.
    pub fn empty() -> Self {
        Self {
            inserted_sections: Vec::new(),
            removed_sections: Vec::new(),
            inserted: Vec::new(),
            removed: Vec::new(),
            updated: Vec::new(),
            moved: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.inserted_sections.len()
            + self.removed_sections.len()
            + self.inserted.len()
            + self.removed.len()
            + self.updated.len()
            + self.moved.len()
    }

    /// All entries in the order a list UI should apply them: updates,
    /// removals, insertions, then moves.
    pub fn changes(&self) -> Vec<Change<'_, R>> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(self.updated.iter().map(|c| Change::Update {
            path: c.path,
            record: &c.record,
        }));
        out.extend(self.removed.iter().map(|c| Change::Remove {
            path: c.path,
            record: &c.record,
        }));
        out.extend(self.removed_sections.iter().map(|c| Change::RemoveSection {
            index: c.index,
            section: &c.section,
        }));
        out.extend(self.inserted_sections.iter().map(|c| Change::InsertSection {
            index: c.index,
            section: &c.section,
        }));
        out.extend(self.inserted.iter().map(|c| Change::Insert {
            path: c.path,
            record: &c.record,
        }));
        out.extend(self.moved.iter().map(|m| Change::Move {
            from: m.from,
            to: m.to,
            record: &m.record,
        }));
        out
    }
}

impl<'a, R> IntoIterator for &'a ChangeSet<R> {
    type Item = Change<'a, R>;
    type IntoIter = std::vec::IntoIter<Change<'a, R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes().into_iter()
    }
}

impl<R> Default for ChangeSet<R> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Compares two snapshots.
///
/// `updated` lists records whose content changed this cycle (the digest's
/// updates). An updated record that also moved is reported only as a move;
/// one that was removed or inserted is reported only as that.
pub fn diff<R: Record>(
    old: &SectionedResultSet<R>,
    new: &SectionedResultSet<R>,
    updated: &[R],
) -> ChangeSet<R> {
    let mut changes = ChangeSet::empty();

    // Sections, by key.
    let section_edits = sequence_diff::diff(&old.section_keys(), &new.section_keys());
    for edit in &section_edits {
        match *edit {
            Edit::Delete { old: index } => changes.removed_sections.push(SectionChange {
                index,
                section: old.sections()[index].info(),
            }),
            Edit::Insert { new: index } => changes.inserted_sections.push(SectionChange {
                index,
                section: new.sections()[index].info(),
            }),
            Edit::Equal { .. } => {}
        }
    }

    // Rows, by identity over the flattened lists.
    let row_edits = sequence_diff::diff_by_key(old.flat(), new.flat(), |r: &R| r.id());
    let mut raw_removed: Vec<usize> = Vec::new();
    let mut raw_inserted: Vec<usize> = Vec::new();
    let mut kept: Vec<(usize, usize)> = Vec::new();
    for edit in &row_edits {
        match *edit {
            Edit::Delete { old: from } => raw_removed.push(from),
            Edit::Insert { new: to } => raw_inserted.push(to),
            Edit::Equal { old: from, new: to } => kept.push((from, to)),
        }
    }

    // A removal and an insertion of the same identity is a move.
    let inserted_at: HashMap<R::Id, usize> = raw_inserted
        .iter()
        .map(|&index| (new.flat()[index].id(), index))
        .collect();
    let mut move_pairs: Vec<(usize, usize)> = Vec::new();
    let mut paired_new: HashSet<usize> = HashSet::new();
    raw_removed.retain(|&old_index| {
        match inserted_at.get(&old.flat()[old_index].id()) {
            Some(&new_index) => {
                move_pairs.push((old_index, new_index));
                paired_new.insert(new_index);
                false
            }
            None => true,
        }
    });
    raw_inserted.retain(|index| !paired_new.contains(index));

    // A record whose flat position matched but whose section changed still
    // has a new index path.
    for &(old_index, new_index) in &kept {
        let (Some(from), Some(to)) = (old.index_path_at(old_index), new.index_path_at(new_index))
        else {
            continue;
        };
        if old.sections()[from.section].key() != new.sections()[to.section].key() {
            move_pairs.push((old_index, new_index));
        }
    }
    move_pairs.sort_unstable();

    let mut touched: HashSet<R::Id> = HashSet::new();

    for old_index in raw_removed {
        let record = &old.flat()[old_index];
        if let Some(path) = old.index_path_at(old_index) {
            touched.insert(record.id());
            changes.removed.push(RowChange {
                path,
                record: record.clone(),
            });
        }
    }

    for new_index in raw_inserted {
        let record = &new.flat()[new_index];
        if let Some(path) = new.index_path_at(new_index) {
            touched.insert(record.id());
            changes.inserted.push(RowChange {
                path,
                record: record.clone(),
            });
        }
    }

    for (old_index, new_index) in move_pairs {
        let record = &new.flat()[new_index];
        if let (Some(from), Some(to)) = (old.index_path_at(old_index), new.index_path_at(new_index))
        {
            touched.insert(record.id());
            changes.moved.push(RowMove {
                from,
                to,
                record: record.clone(),
            });
        }
    }

    let mut reported: HashSet<R::Id> = HashSet::new();
    for record in updated {
        let id = record.id();
        if touched.contains(&id) || reported.contains(&id) {
            continue;
        }
        let Some(current) = new.get(&id) else {
            continue;
        };
        if let Some(path) = old.index_path(record) {
            changes.updated.push(RowChange {
                path,
                record: current.clone(),
            });
            reported.insert(id);
        }
    }
    changes.updated.sort_by_key(|c| c.path);

    changes
}
