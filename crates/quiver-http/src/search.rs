//! Search-parameter trees and their flattening into query pairs.

use chrono::{DateTime, SecondsFormat, Utc};

/// A value in a search-parameter tree.
///
/// Nested maps and sequences flatten into bracketed keys (`a[b]`, `a[0]`),
/// datetimes render as ISO-8601 with millisecond precision, and null or
/// empty-string values keep their key with an empty value.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    Map(SearchParams),
    Seq(Vec<SearchValue>),
}

impl From<bool> for SearchValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for SearchValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for SearchValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SearchValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SearchValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SearchValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for SearchValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<SearchParams> for SearchValue {
    fn from(value: SearchParams) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<SearchValue>> for SearchValue {
    fn from(value: Vec<SearchValue>) -> Self {
        Self::Seq(value)
    }
}

/// An insertion-ordered string-keyed map of search values.
///
/// Iteration order is the order keys were first set, matching how the
/// flattener emits pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    entries: Vec<(String, SearchValue)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SearchValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SearchValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&SearchValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SearchValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Shallow merge: `right` keys override `left` keys, left-only keys keep
    /// their position.
    pub fn merged(left: &SearchParams, right: &SearchParams) -> SearchParams {
        let mut out = left.clone();
        for (key, value) in right.iter() {
            out.set(key, value.clone());
        }
        out
    }
}

/// One flattened query pair. Values are already percent-encoded where the
/// flattening rules call for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPair {
    pub key: String,
    pub value: String,
}

/// Flatten a search tree depth-first into ordered key/value pairs.
pub fn flatten(search: &SearchParams) -> Vec<SearchPair> {
    let mut out = Vec::new();
    flatten_map(search, None, &mut out);
    out
}

fn flatten_map(map: &SearchParams, parent: Option<&str>, out: &mut Vec<SearchPair>) {
    for (name, value) in map.iter() {
        let key = match parent {
            Some(parent) => format!("{parent}[{name}]"),
            None => name.to_string(),
        };
        flatten_value(value, &key, out);
    }
}

fn flatten_value(value: &SearchValue, key: &str, out: &mut Vec<SearchPair>) {
    match value {
        SearchValue::Null => out.push(SearchPair {
            key: key.to_string(),
            value: String::new(),
        }),
        SearchValue::Text(text) if text.is_empty() => out.push(SearchPair {
            key: key.to_string(),
            value: String::new(),
        }),
        SearchValue::DateTime(at) => out.push(SearchPair {
            key: key.to_string(),
            value: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
        SearchValue::Map(map) => flatten_map(map, Some(key), out),
        SearchValue::Seq(items) => {
            // Sequence indices become child keys.
            for (index, item) in items.iter().enumerate() {
                flatten_value(item, &format!("{key}[{index}]"), out);
            }
        }
        SearchValue::Bool(value) => push_primitive(key, &value.to_string(), out),
        SearchValue::Int(value) => push_primitive(key, &value.to_string(), out),
        SearchValue::Float(value) => push_primitive(key, &value.to_string(), out),
        SearchValue::Text(text) => push_primitive(key, text, out),
    }
}

fn push_primitive(key: &str, raw: &str, out: &mut Vec<SearchPair>) {
    out.push(SearchPair {
        key: key.to_string(),
        value: urlencoding::encode(raw).into_owned(),
    });
}
