//! Wire-level DTOs shared by every resource kind.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::schema::Field;

/// Server-assigned identity of one resource (`$key`).
///
/// The API emits keys as integers for most collections; they are carried as
/// strings because the client only ever echoes them back into paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<u64> for ResourceKey {
    fn from(key: u64) -> Self {
        Self(key.to_string())
    }
}

impl Serialize for ResourceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ResourceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawKey {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match RawKey::deserialize(deserializer)? {
            RawKey::Number(n) => Self(n.to_string()),
            RawKey::Text(s) => Self(s),
        })
    }
}

/// `{"$key": .., "err": ..}` wrapper returned by writes and error bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "$key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<ResourceKey>,
    #[serde(rename = "err", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// The server's error message, ignoring an empty `err`.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// The assigned key, ignoring an empty `$key`.
    pub fn key(&self) -> Option<&ResourceKey> {
        self.key.as_ref().filter(|k| !k.is_empty())
    }
}

/// A resource exactly as the server last returned it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedState {
    body: Map<String, Value>,
}

impl ObservedState {
    pub fn new(body: Map<String, Value>) -> Self {
        Self { body }
    }

    /// The `$key` of this entry, if the selection included it.
    pub fn key(&self) -> Option<ResourceKey> {
        self.body
            .get("$key")
            .and_then(|v| ResourceKey::deserialize(v).ok())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn field<F: Field>(&self, field: F) -> Option<&Value> {
        self.get(field.spec().key)
    }

    /// True when `key` is present and equal to `expected`.
    pub fn matches(&self, key: &str, expected: &Value) -> bool {
        self.body.get(key) == Some(expected)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.body
    }

    /// Decode into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(Value::Object(self.body.clone()))
    }
}
