//! Concrete assignments of values to parameter identifiers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Mapping from parameter id to its value, preserving insertion order.
///
/// No key is required: any subset of a catalog's ids may be present, and keys
/// unknown to a catalog are simply ignored by consumers. Equality is deep and
/// independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueSet(IndexMap<String, JsonValue>);

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw stored value for `id`, including explicit `null`s.
    pub fn get(&self, id: &str) -> Option<&JsonValue> {
        self.0.get(id)
    }

    /// Returns the value for `id` when it is defined (present and not `null`).
    pub fn defined(&self, id: &str) -> Option<&JsonValue> {
        self.0.get(id).filter(|value| !value.is_null())
    }

    pub fn insert(&mut self, id: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.0.insert(id.into(), value)
    }

    /// Removes `id`, keeping the relative order of the remaining entries.
    pub fn remove(&mut self, id: &str) -> Option<JsonValue> {
        self.0.shift_remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.0.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<IndexMap<String, JsonValue>> for ValueSet {
    fn from(values: IndexMap<String, JsonValue>) -> Self {
        Self(values)
    }
}

impl<K: Into<String>> FromIterator<(K, JsonValue)> for ValueSet {
    fn from_iter<T: IntoIterator<Item = (K, JsonValue)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(id, value)| (id.into(), value)).collect())
    }
}

impl IntoIterator for ValueSet {
    type Item = (String, JsonValue);
    type IntoIter = indexmap::map::IntoIter<String, JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
