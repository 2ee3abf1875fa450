//! Rows read from the store and records written to it.

use crate::{
    Ident, Value,
    error::{QueryError, Result},
};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A row decoded from the store's column metadata.
///
/// Columns keep the order the statement reported them in, and that order
/// survives serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Appends a column without checking for duplicates.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push((column.into(), value));
    }

    /// Sets `column`, replacing an existing value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.get_mut(&column) {
            Some(slot) => *slot = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, column: &str) -> Option<&mut Value> {
        self.columns
            .iter_mut()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.columns.iter().position(|(name, _)| name == column)?;
        Some(self.columns.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.columns.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Converts to a JSON object in column order.
    pub fn into_json(self) -> serde_json::Map<String, serde_json::Value> {
        self.columns
            .into_iter()
            .map(|(k, v)| {
                let json = v.to_json();
                (k, json)
            })
            .collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (k, v) in &self.columns {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Column values to write, decoded from a JSON request body.
///
/// Keys are validated identifiers; nested arrays and objects are stored as
/// their JSON text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(Ident, Value)>,
}

impl Record {
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Decodes a request body, which must be a JSON object.
    pub fn from_json(body: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = body else {
            return Err(QueryError::InvalidBody(
                "expected a JSON object".to_string(),
            ));
        };
        let mut record = Self {
            fields: Vec::with_capacity(map.len()),
        };
        for (key, value) in map {
            record.set(Ident::new(&key)?, Value::from_json(value));
        }
        Ok(record)
    }

    /// Sets `column`, replacing an existing value in place.
    pub fn set(&mut self, column: Ident, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Sets `column` only when the body did not supply it.
    pub fn set_default(&mut self, column: Ident, value: impl FnOnce() -> Value) {
        if !self.contains(column.as_str()) {
            self.fields.push((column, value()));
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Ident> {
        self.fields.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ident, &Value)> {
        self.fields.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a (Ident, Value);
    type IntoIter = std::slice::Iter<'a, (Ident, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
