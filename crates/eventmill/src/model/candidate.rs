//! Loose extraction output.
//!
//! Generation returns events as free-form JSON objects. `Candidate` wraps one
//! such object while the normalizer repairs it field by field; only once the
//! repairs are done is it promoted into a typed [`super::Event`]. Keeping the
//! loose phase behind this type means every mutation goes through a named
//! operation instead of ad-hoc map edits.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event::Event;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate {
    fields: Map<String, Value>,
}

impl Candidate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Wraps a JSON value, or `None` when it is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// True when the field holds a non-empty string.
    pub fn has_text(&self, key: &str) -> bool {
        self.get_str(key).is_some_and(|text| !text.is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn set_null(&mut self, key: &str) {
        self.fields.insert(key.to_string(), Value::Null);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Inserts `default` only when the key is absent. An explicit null is a
    /// present value and is left alone.
    pub fn ensure(&mut self, key: &str, default: impl Into<Value>) {
        self.fields
            .entry(key.to_string())
            .or_insert_with(|| default.into());
    }

    /// Shallow merge: every field of `patch` overwrites the same field here.
    pub fn merge(&mut self, patch: Candidate) {
        for (key, value) in patch.fields {
            self.fields.insert(key, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Promotes the repaired candidate into a typed event. Field-level
    /// failures (bad dates, unknown enum values that slipped past the
    /// sanitizer, nulls in non-nullable fields) surface here.
    pub fn promote(self) -> Result<Event, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields))
    }
}
