//! Variant value model for analyzer requests and responses.
//!
//! Responses are traversed by key lookup; a missing key or a value of the
//! wrong shape yields `None`, never a fault. At the dylib boundary values
//! cross as JSON, with UIDs carried as their string spelling; traversal
//! re-interns them on demand.

use std::collections::BTreeMap;

use crate::uid::Uid;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    Uid(Uid),
    Array(Vec<Value>),
    Dict(BTreeMap<Uid, Value>),
}

impl Value {
    // ── shape accessors ────────────────────────────────────────────

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Uid(u) => Some(u.as_str()),
            _ => None,
        }
    }

    /// UIDs arriving over the JSON seam are plain strings; re-intern.
    #[must_use]
    pub fn as_uid(&self) -> Option<Uid> {
        match self {
            Self::Uid(u) => Some(u.clone()),
            Self::String(s) => Some(Uid::intern(s)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_dict(&self) -> Option<&BTreeMap<Uid, Value>> {
        match self {
            Self::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    // ── keyed traversal ────────────────────────────────────────────

    #[must_use]
    pub fn get(&self, key: &Uid) -> Option<&Value> {
        self.as_dict()?.get(key)
    }

    #[must_use]
    pub fn string(&self, key: &Uid) -> Option<&str> {
        self.get(key)?.as_str()
    }

    #[must_use]
    pub fn int(&self, key: &Uid) -> Option<i64> {
        self.get(key)?.as_int()
    }

    #[must_use]
    pub fn bool(&self, key: &Uid) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    #[must_use]
    pub fn uid(&self, key: &Uid) -> Option<Uid> {
        self.get(key)?.as_uid()
    }

    #[must_use]
    pub fn array(&self, key: &Uid) -> Option<&[Value]> {
        self.get(key)?.as_array()
    }

    // ── JSON seam ──────────────────────────────────────────────────

    /// Encode for the dylib boundary. UIDs flatten to strings.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::String(s) => serde_json::Value::from(s.clone()),
            Self::Uid(u) => serde_json::Value::from(u.as_str()),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Dict(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.as_str().to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Decode from the dylib boundary. Strings stay strings until a
    /// caller asks for a UID; non-integer numbers have no analyzer
    /// counterpart and decode as `Null`.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n.as_i64().map_or(Self::Null, Self::Int),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => {
                Self::Array(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(entries) => Self::Dict(
                entries
                    .iter()
                    .map(|(k, v)| (Uid::intern(k), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Uid> for Value {
    fn from(u: Uid) -> Self {
        Self::Uid(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Uid {
        Uid::intern(s)
    }

    fn sample_dict() -> Value {
        Value::Dict(BTreeMap::from([
            (key("key.offset"), Value::Int(12)),
            (key("key.name"), Value::from("foo")),
            (key("key.kind"), Value::Uid(key("source.lang.swift.decl.class"))),
            (
                key("key.results"),
                Value::Array(vec![Value::Int(1), Value::Int(2)]),
            ),
        ]))
    }

    #[test]
    fn test_keyed_lookup() {
        let dict = sample_dict();
        assert_eq!(dict.int(&key("key.offset")), Some(12));
        assert_eq!(dict.string(&key("key.name")), Some("foo"));
        assert_eq!(dict.array(&key("key.results")).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_key_is_none() {
        let dict = sample_dict();
        assert!(dict.get(&key("key.absent")).is_none());
        assert!(dict.int(&key("key.absent")).is_none());
    }

    #[test]
    fn test_type_mismatch_is_none_not_fault() {
        let dict = sample_dict();
        assert!(dict.int(&key("key.name")).is_none());
        assert!(dict.array(&key("key.offset")).is_none());
        assert!(dict.bool(&key("key.offset")).is_none());
    }

    #[test]
    fn test_lookup_on_non_dict_is_none() {
        assert!(Value::Int(1).get(&key("key.offset")).is_none());
        assert!(Value::Null.string(&key("key.name")).is_none());
    }

    #[test]
    fn test_uid_accessor_interns_strings() {
        let dict = Value::Dict(BTreeMap::from([(
            key("key.kind"),
            Value::from("source.lang.swift.decl.struct"),
        )]));
        let uid = dict.uid(&key("key.kind")).unwrap();
        assert_eq!(uid, key("source.lang.swift.decl.struct"));
    }

    #[test]
    fn test_json_roundtrip_flattens_uids() {
        let dict = sample_dict();
        let json = dict.to_json();
        assert_eq!(json["key.kind"], "source.lang.swift.decl.class");

        let back = Value::from_json(&json);
        // The UID came back as a string; keyed uid() lookup still works.
        assert_eq!(
            back.uid(&key("key.kind")),
            Some(key("source.lang.swift.decl.class"))
        );
        assert_eq!(back.int(&key("key.offset")), Some(12));
    }

    #[test]
    fn test_from_json_drops_floats() {
        let json = serde_json::json!({ "key.x": 1.5 });
        let value = Value::from_json(&json);
        assert_eq!(value.get(&key("key.x")), Some(&Value::Null));
    }
}
