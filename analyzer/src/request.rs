//! Typed request building over the value model.

use std::collections::BTreeMap;

use crate::keys::tables;
use crate::uid::Uid;
use crate::value::Value;

/// Builds an analyzer request dictionary.
///
/// The request-name UID goes under `key.request`; remaining entries are
/// heterogeneous (integers, strings, UIDs, string arrays, flags).
#[derive(Debug)]
pub struct RequestBuilder {
    entries: BTreeMap<Uid, Value>,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(request: &Uid) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(tables().keys.request.clone(), Value::Uid(request.clone()));
        Self { entries }
    }

    #[must_use]
    pub fn int(mut self, key: &Uid, value: i64) -> Self {
        self.entries.insert(key.clone(), Value::Int(value));
        self
    }

    #[must_use]
    pub fn string(mut self, key: &Uid, value: impl Into<String>) -> Self {
        self.entries.insert(key.clone(), Value::String(value.into()));
        self
    }

    #[must_use]
    pub fn uid(mut self, key: &Uid, value: &Uid) -> Self {
        self.entries.insert(key.clone(), Value::Uid(value.clone()));
        self
    }

    #[must_use]
    pub fn flag(mut self, key: &Uid, value: bool) -> Self {
        self.entries.insert(key.clone(), Value::Bool(value));
        self
    }

    #[must_use]
    pub fn strings<I, S>(mut self, key: &Uid, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = values
            .into_iter()
            .map(|s| Value::String(s.into()))
            .collect();
        self.entries.insert(key.clone(), Value::Array(items));
        self
    }

    /// Set `key` only when `value` is present.
    #[must_use]
    pub fn maybe_strings(self, key: &Uid, values: Option<Vec<String>>) -> Self {
        match values {
            Some(values) => self.strings(key, values),
            None => self,
        }
    }

    #[must_use]
    pub fn build(self) -> Value {
        Value::Dict(self.entries)
    }
}
