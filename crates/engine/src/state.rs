//! Configuration state: the current field map of one session.

use std::fmt;

use assetwright_core::Domain;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A field value: a single canonical spelling, or a sequence for list fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    Sequence(Vec<String>),
}

impl FieldValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    /// True if the value carries no user-specified information.
    pub fn is_sentinel(&self, sentinel: &str) -> bool {
        match self {
            Self::Scalar(s) => s.eq_ignore_ascii_case(sentinel),
            Self::Sequence(items) => items.iter().all(|s| s.eq_ignore_ascii_case(sentinel)),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Scalar(s) => Value::String(s.clone()),
            Self::Sequence(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => f.write_str(s),
            Self::Sequence(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// A complete field map for one domain, in schema order.
///
/// Only the validator constructs these, so every value is either legal for
/// its field or the domain sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigState {
    domain: Domain,
    fields: Vec<(&'static str, FieldValue)>,
}

impl ConfigState {
    pub(crate) fn from_fields(domain: Domain, fields: Vec<(&'static str, FieldValue)>) -> Self {
        Self { domain, fields }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of fields whose value differs from `other`.
    pub fn diff(&self, other: &ConfigState) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|(name, value)| other.get(name) != Some(value))
            .map(|(name, _)| *name)
            .collect()
    }

    /// True if every field is at the sentinel.
    pub fn is_unset(&self, sentinel: &str) -> bool {
        self.fields.iter().all(|(_, v)| v.is_sentinel(sentinel))
    }

    /// Unordered JSON view, used as validator input and for overlaying.
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.to_json()))
            .collect()
    }

    /// Pretty JSON in schema order.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".into())
    }

    /// Compact JSON in schema order.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}

impl Serialize for ConfigState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
