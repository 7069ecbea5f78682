//! Publish record: the metadata map submitted to the content index.

use crate::columns;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text column
    #[display("{}", _0)]
    Text(String),
    /// Integer column (timestamps, flags)
    #[display("{}", _0)]
    Integer(i64),
}

impl FieldValue {
    /// Text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Integer(_) => None,
        }
    }

    /// Integer content, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

/// Key-value metadata submitted on insert and on partial update.
///
/// Keys are kept ordered so catalog rows and log output are stable.
///
/// # Examples
///
/// ```
/// use mediastash_core::{columns, PublishRecord};
///
/// let record = PublishRecord::new()
///     .with(columns::DISPLAY_NAME, "song.mp3")
///     .with(columns::IS_PENDING, true);
///
/// assert_eq!(record.text(columns::DISPLAY_NAME), Some("song.mp3"));
/// assert_eq!(record.is_pending(), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl PublishRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record containing only `is_pending = 0`, the commit update.
    pub fn commit() -> Self {
        Self::new().with(columns::IS_PENDING, false)
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.put(key, value);
        self
    }

    /// Insert or replace a field.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Look up a text field.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    /// Look up an integer field.
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(FieldValue::as_integer)
    }

    /// Pending flag, if the record carries one.
    pub fn is_pending(&self) -> Option<bool> {
        self.integer(columns::IS_PENDING).map(|flag| flag != 0)
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    /// Overlay `other` on top of this record (partial update semantics).
    pub fn merge(&mut self, other: &PublishRecord) {
        for (key, value) in &other.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
