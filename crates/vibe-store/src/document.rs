//! Documents, ids and filters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Result, StoreError};

/// Field holding the document id in serialized documents.
pub const ID_FIELD: &str = "_id";

/// Unique id of a stored document or blob: 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Parses an id received from a client.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(StoreError::InvalidId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored document: an id plus a JSON object of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Builds a document from a JSON object value.
    pub fn from_value(id: DocumentId, collection: &str, value: Value) -> Result<Self> {
        match value {
            Value::Object(mut fields) => {
                fields.remove(ID_FIELD);
                Ok(Self { id, fields })
            }
            _ => Err(StoreError::NotAnObject(collection.to_string())),
        }
    }

    /// Gets a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Serializes the document with its id under `_id`.
    pub fn to_json(&self) -> Value {
        let mut fields = self.fields.clone();
        fields.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        Value::Object(fields)
    }
}

/// A single field condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value.
    Eq(Value),
    /// Field is an array holding the value.
    Contains(Value),
}

impl Condition {
    fn matches(&self, field: Option<&Value>) -> bool {
        match (self, field) {
            (Condition::Eq(expected), Some(actual)) => expected == actual,
            (Condition::Contains(expected), Some(Value::Array(items))) => items.contains(expected),
            _ => false,
        }
    }
}

/// Conjunction of field conditions. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    /// Creates a filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Requires `field == value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.into(), Condition::Eq(value.into())));
        self
    }

    /// Requires the array `field` to contain `value`.
    pub fn contains(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.into(), Condition::Contains(value.into())));
        self
    }

    /// Checks a document against every condition.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions.iter().all(|(field, condition)| {
            if field == ID_FIELD {
                condition.matches(Some(&Value::String(document.id.to_string())))
            } else {
                condition.matches(document.get(field))
            }
        })
    }
}
