//! The authoritative sectioned snapshot.
//!
//! A `SectionedResultSet` keeps two views of the same records in lockstep:
//! the flattened list in global order and the per-section lists. Applying a
//! digest mutates both; the derived section caches are rebuilt lazily on
//! first use after every mutation.

use crate::config::Configuration;
use crate::section::{Section, SectionInfo};
use sectionsync_batch::Digest;
use sectionsync_types::{IndexPath, Record};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// What a single [`SectionedResultSet::apply`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Records inserted, including the re-insert half of updates.
    pub inserted: usize,
    /// Records removed by deletions, including the delete half of updates.
    pub removed: usize,
    /// Inserted or updated records rejected by the filter.
    pub filtered: usize,
    /// Records dropped from the tail to honour the fetch limit.
    pub truncated: usize,
}

/// Section position and flat-list offset per section key.
#[derive(Debug, Clone, Default)]
struct SectionCaches {
    index_by_key: HashMap<String, usize>,
    offset_by_key: HashMap<String, usize>,
}

/// A filtered, sorted and sectioned view over a set of records.
///
/// Invariants:
/// - every identity appears at most once
/// - `flat()` is the concatenation of the sections, in section order
/// - every section is sorted by the configured order, with ties kept in
///   insertion order
/// - every record passes the configured filter
#[derive(Clone)]
pub struct SectionedResultSet<R: Record> {
    configuration: Configuration<R>,
    flat: Vec<R>,
    sections: Vec<Section<R>>,
    /// Identity to current section key.
    keys: HashMap<R::Id, String>,
    caches: OnceLock<SectionCaches>,
}

impl<R: Record> SectionedResultSet<R> {
    /// Creates an empty result set governed by `configuration`.
    pub fn new(configuration: Configuration<R>) -> Self {
        Self {
            configuration,
            flat: Vec::new(),
            sections: Vec::new(),
            keys: HashMap::new(),
            caches: OnceLock::new(),
        }
    }

    /// Creates a result set holding every record that passes the filter.
    pub fn from_records(configuration: Configuration<R>, records: Vec<R>) -> Self {
        let mut set = Self::new(configuration);
        set.apply(&Digest::inserting(records), 0);
        set
    }

    /// Creates an empty result set with the same configuration.
    pub fn empty_like(&self) -> Self {
        Self::new(self.configuration.clone())
    }

    /// The rules this result set maintains.
    pub fn configuration(&self) -> &Configuration<R> {
        &self.configuration
    }

    /// All records in global order.
    pub fn flat(&self) -> &[R] {
        &self.flat
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// Sections in section order.
    pub fn sections(&self) -> &[Section<R>] {
        &self.sections
    }

    /// Section keys in section order.
    pub fn section_keys(&self) -> Vec<&str> {
        self.sections.iter().map(Section::key).collect()
    }

    /// Consumer-facing section summaries in section order.
    pub fn section_infos(&self) -> Vec<SectionInfo> {
        self.sections.iter().map(Section::info).collect()
    }

    /// Returns true if a record with this identity is present.
    pub fn contains(&self, id: &R::Id) -> bool {
        self.keys.contains_key(id)
    }

    /// Looks up the record at an index path.
    pub fn object(&self, path: IndexPath) -> Option<&R> {
        self.sections
            .get(path.section)
            .and_then(|section| section.objects.get(path.row))
    }

    /// Looks up a record by identity.
    pub fn get(&self, id: &R::Id) -> Option<&R> {
        let key = self.keys.get(id)?;
        let section = self.sections.get(self.position_of_key(key)?)?;
        section.objects.iter().find(|r| r.id() == *id)
    }

    // ── Derived caches ───────────────────────────────────────────

    fn caches(&self) -> &SectionCaches {
        self.caches.get_or_init(|| {
            let mut caches = SectionCaches::default();
            let mut offset = 0;
            for (index, section) in self.sections.iter().enumerate() {
                caches.index_by_key.insert(section.key.clone(), index);
                caches.offset_by_key.insert(section.key.clone(), offset);
                offset += section.objects.len();
            }
            caches
        })
    }

    fn invalidate(&mut self) {
        self.caches = OnceLock::new();
    }

    /// The section key a record is filed under: its stored key if present,
    /// otherwise the key the configuration derives for it.
    fn key_of(&self, record: &R) -> String {
        match self.keys.get(&record.id()) {
            Some(key) => key.clone(),
            None => self.configuration.section_key(record),
        }
    }

    /// Position of the record's section in the ordered section list.
    pub fn section_index(&self, record: &R) -> Option<usize> {
        let key = self.key_of(record);
        self.caches().index_by_key.get(&key).copied()
    }

    /// Flat-list index at which the record's section begins.
    pub fn section_offset(&self, record: &R) -> Option<usize> {
        let key = self.key_of(record);
        self.caches().offset_by_key.get(&key).copied()
    }

    /// Index path of the record with the same identity, if present.
    pub fn index_path(&self, record: &R) -> Option<IndexPath> {
        let id = record.id();
        self.sections
            .iter()
            .enumerate()
            .find_map(|(section, s)| {
                s.objects
                    .iter()
                    .position(|r| r.id() == id)
                    .map(|row| IndexPath::new(section, row))
            })
    }

    /// Converts a flat-list index into an index path.
    pub fn index_path_at(&self, flat_index: usize) -> Option<IndexPath> {
        let record = self.flat.get(flat_index)?;
        let section = self.section_index(record)?;
        let offset = self.section_offset(record)?;
        Some(IndexPath::new(section, flat_index - offset))
    }

    // ── Mutation ─────────────────────────────────────────────────

    /// Applies a digest: deletions, then updates, then insertions, then the
    /// fetch limit. A `limit` of zero means unlimited.
    pub fn apply(&mut self, digest: &Digest<R>, limit: usize) -> ApplyStats {
        let mut stats = ApplyStats::default();

        for record in &digest.deleted {
            if self.remove(&record.id()).is_some() {
                stats.removed += 1;
            }
        }

        // The section key may change with the content, so updates are a
        // delete of the old value followed by an insert of the new one.
        for record in &digest.updated {
            if self.remove(&record.id()).is_some() {
                stats.removed += 1;
            }
            if self.insert(record.clone()) {
                stats.inserted += 1;
            } else {
                stats.filtered += 1;
            }
        }

        for record in &digest.inserted {
            if self.insert(record.clone()) {
                stats.inserted += 1;
            } else {
                stats.filtered += 1;
            }
        }

        stats.truncated = self.truncate(limit);
        stats
    }

    /// Inserts a record at its sorted position, replacing any record with the
    /// same identity. Returns false if the filter rejects it.
    pub fn insert(&mut self, record: R) -> bool {
        if !self.configuration.includes(&record) {
            return false;
        }

        let id = record.id();
        if self.keys.contains_key(&id) {
            self.remove(&id);
        }

        let key = self.configuration.section_key(&record);
        let position = match self.position_of_key(&key) {
            Some(position) => position,
            None => {
                let position = self
                    .sections
                    .partition_point(|s| self.configuration.section_precedes(&s.key, &key));
                self.sections.insert(position, Section::new(key.clone()));
                position
            }
        };

        let offset: usize = self.sections[..position].iter().map(Section::len).sum();
        let section = &mut self.sections[position];
        let row = section
            .objects
            .partition_point(|existing| !self.configuration.precedes(&record, existing));

        // `offset + row` is the slot a binary search over the flat list with
        // `Configuration::flat_precedes` selects.
        section.objects.insert(row, record.clone());
        self.flat.insert(offset + row, record);
        self.keys.insert(id, key);
        self.invalidate();
        true
    }

    /// Removes the record with this identity from the flat list and its
    /// section, dropping the section if it becomes empty.
    pub fn remove(&mut self, id: &R::Id) -> Option<R> {
        let key = self.keys.get(id)?.clone();
        let position = self.position_of_key(&key)?;
        let row = self.sections[position]
            .objects
            .iter()
            .position(|r| r.id() == *id)?;
        let offset: usize = self.sections[..position].iter().map(Section::len).sum();

        self.keys.remove(id);
        let record = self.sections[position].objects.remove(row);
        self.flat.remove(offset + row);
        if self.sections[position].objects.is_empty() {
            self.sections.remove(position);
        }
        self.invalidate();
        Some(record)
    }

    /// Drops every record at flat index `limit` and beyond. Returns how many
    /// were dropped.
    fn truncate(&mut self, limit: usize) -> usize {
        if limit == 0 || self.flat.len() <= limit {
            return 0;
        }

        let overflow: Vec<R::Id> = self.flat[limit..].iter().map(|r| r.id()).collect();
        debug!(
            "Result count {} exceeds limit {}, dropping {} trailing record(s)",
            self.flat.len(),
            limit,
            overflow.len()
        );
        for id in overflow.iter().rev() {
            self.remove(id);
        }
        overflow.len()
    }

    fn position_of_key(&self, key: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.key == key)
    }
}

impl<R: Record + std::fmt::Debug> std::fmt::Debug for SectionedResultSet<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionedResultSet")
            .field("sections", &self.sections)
            .finish_non_exhaustive()
    }
}
