use crate::{Record, RecordId};
use serde::{Deserialize, Serialize};

/// A generic JSON record.
///
/// Useful when the data source hands out schemaless rows. The `data` field
/// holds arbitrary JSON; filters, comparators and section keys read it
/// through [`Document::field`] and its typed variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: RecordId,
    pub kind: String,
    pub data: serde_json::Value,
}

impl Document {
    /// Creates a document with a fresh id.
    pub fn new(kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self::with_id(RecordId::new(), kind, data)
    }

    /// Creates a document with an existing id.
    pub fn with_id(id: RecordId, kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id,
            kind: kind.into(),
            data,
        }
    }

    /// Returns a copy of this document with replaced data and the same id.
    #[must_use]
    pub fn revised(&self, data: serde_json::Value) -> Self {
        Self {
            id: self.id,
            kind: self.kind.clone(),
            data,
        }
    }

    /// Parses a document from its JSON representation.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes this document to JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The JSON value at `pointer` (RFC 6901, e.g. `/meta/owner`) inside
    /// `data`.
    pub fn field(&self, pointer: &str) -> Option<&serde_json::Value> {
        self.data.pointer(pointer)
    }

    /// The string at `pointer`, if the field holds one.
    pub fn text(&self, pointer: &str) -> Option<&str> {
        self.field(pointer)?.as_str()
    }

    /// The number at `pointer`, if the field holds one.
    pub fn number(&self, pointer: &str) -> Option<f64> {
        self.field(pointer)?.as_f64()
    }

    /// The boolean at `pointer`, if the field holds one.
    pub fn flag(&self, pointer: &str) -> Option<bool> {
        self.field(pointer)?.as_bool()
    }

    /// A section key read from the field at `pointer`.
    ///
    /// Strings are used as they are; numbers and booleans by their JSON
    /// text. Any other value, or no value, means the unnamed section.
    pub fn section_key(&self, pointer: &str) -> Option<String> {
        match self.field(pointer)? {
            serde_json::Value::String(s) => Some(s.clone()),
            v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_)) => Some(v.to_string()),
            _ => None,
        }
    }
}

impl Record for Document {
    type Id = RecordId;

    fn id(&self) -> RecordId {
        self.id
    }
}
