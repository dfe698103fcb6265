#![allow(dead_code)]

use sectionsync_results::{Configuration, SectionedResultSet};
use sectionsync_types::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: u32,
    pub section: String,
    pub rank: i32,
}

impl Record for Row {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

pub fn row(id: u32, section: &str, rank: i32) -> Row {
    Row {
        id,
        section: section.to_string(),
        rank,
    }
}

/// Sectioned by `section`, ordered by `rank`.
pub fn sectioned() -> Configuration<Row> {
    Configuration::new()
        .with_section_key(|r: &Row| Some(r.section.clone()))
        .with_sort_key(|r: &Row| r.rank)
}

pub fn ids(set: &SectionedResultSet<Row>) -> Vec<u32> {
    set.flat().iter().map(|r| r.id).collect()
}

pub fn section_ids(set: &SectionedResultSet<Row>) -> Vec<(String, Vec<u32>)> {
    set.sections()
        .iter()
        .map(|s| (s.key().to_string(), s.objects().iter().map(|r| r.id).collect()))
        .collect()
}
