use serde::{Deserialize, Serialize};

/// A named, ordered bucket of records sharing one section key.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<R> {
    pub(crate) key: String,
    pub(crate) objects: Vec<R>,
}

impl<R> Section<R> {
    pub(crate) fn new(key: String) -> Self {
        Self {
            key,
            objects: Vec::new(),
        }
    }

    /// The section key. The unnamed default section has an empty key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The records in this section, in configured order.
    pub fn objects(&self) -> &[R] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Consumer-facing summary of this section.
    pub fn info(&self) -> SectionInfo {
        SectionInfo {
            name: self.key.clone(),
            number_of_objects: self.objects.len(),
        }
    }
}

/// What a list UI needs to know about a section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionInfo {
    pub name: String,
    pub number_of_objects: usize,
}
