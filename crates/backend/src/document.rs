//! Documents, queries and snapshots exchanged with the document store.
//!
//! Documents carry their fields as plain JSON. Typed records are produced by
//! [`Document::decode`] and turned back into fields with [`to_fields`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;

/// Field map of a document.
pub type Fields = serde_json::Map<String, Value>;

/// Pseudo field path addressing the document id in a [`Filter`].
pub const DOCUMENT_ID: &str = "__name__";

/// A single stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Id within its collection.
    pub id: String,
    /// Stored fields.
    pub fields: Fields,
}

impl Document {
    /// Create a document from its id and fields.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode into a typed record.
    ///
    /// The document id is injected as an `id` field, and null fields are
    /// treated as absent so `#[serde(default)]` applies to them.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Decode` if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut map: Fields = self
            .fields
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        map.insert("id".to_owned(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Read a string field.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Encode a record as document fields, dropping any `id` field.
///
/// # Errors
///
/// Returns `StoreError::Encode` if the value does not serialize to a JSON
/// object.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(StoreError::Encode(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Comparison used by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    NotEqual,
}

/// One field condition of a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// Whether `doc` satisfies this condition.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        let actual = if self.field == DOCUMENT_ID {
            Some(Value::String(doc.id.clone()))
        } else {
            doc.fields.get(&self.field).cloned()
        };
        match self.op {
            FilterOp::Equal => actual.as_ref() == Some(&self.value),
            // Documents missing the field never match an inequality, as in Firestore.
            FilterOp::NotEqual => actual.is_some_and(|value| value != self.value),
        }
    }
}

/// Conjunction of field filters with an optional result limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub limit: Option<usize>,
}

impl Query {
    /// A query matching every document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op: FilterOp::Equal,
            value: value.into(),
        });
        self
    }

    /// Require `field != value`.
    #[must_use]
    pub fn where_ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op: FilterOp::NotEqual,
            value: value.into(),
        });
        self
    }

    /// Exclude the document with the given id.
    #[must_use]
    pub fn excluding_id(self, id: impl Into<String>) -> Self {
        self.where_ne(DOCUMENT_ID, id.into())
    }

    /// Return at most `limit` documents.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `doc` satisfies every filter.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(doc))
    }

    /// Apply the query to an in-memory document list.
    #[must_use]
    pub fn apply<'a>(&self, docs: impl IntoIterator<Item = &'a Document>) -> Vec<Document> {
        docs.into_iter()
            .filter(|doc| self.matches(doc))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

/// Full contents of a collection at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
}

impl Snapshot {
    /// Decode every document, skipping (and logging) ones that do not fit `T`.
    #[must_use]
    pub fn decode_all<T: DeserializeOwned>(&self) -> Vec<T> {
        self.documents
            .iter()
            .filter_map(|doc| match doc.decode() {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(doc_id = %doc.id, error = %e, "Skipping undecodable document");
                    None
                }
            })
            .collect()
    }
}
