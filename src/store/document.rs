//! Store documents and the patch merge policy
//!
//! Every store value is a JSON object. The type is opaque to the propagation
//! engine; only the well-known section keys below carry meaning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sub-map of the root store holding the user's form fields
pub const FORM_FIELDS_KEY: &str = "formData";

/// Section of a computed store holding the compute hook result
pub const RESULTS_KEY: &str = "results";

/// Section of a computed store holding its own module inputs
pub const INPUTS_KEY: &str = "inputs";

/// Section of a computed store holding the basic data it was computed from
pub const BASIC_DATA_KEY: &str = "basicData";

/// A store value: a JSON object with string keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Convert a JSON value, rejecting anything that is not an object
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(format!("expected a JSON object, got {}", kind(&other))),
        }
    }

    /// Parse a document from JSON text
    pub fn parse(text: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        Self::from_value(value)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of an object-valued section, or an empty document when the
    /// section is absent or not an object
    pub fn section(&self, key: &str) -> Document {
        match self.0.get(key) {
            Some(Value::Object(map)) => Self(map.clone()),
            _ => Self::new(),
        }
    }

    /// Merge a partial document into this one.
    ///
    /// Top-level keys of `partial` replace the stored keys wholesale, except
    /// [`FORM_FIELDS_KEY`]: when both sides hold an object there, the incoming
    /// fields are merged one level deep so a partial form update keeps the
    /// fields it does not mention.
    pub fn merge(&mut self, partial: Document) {
        for (key, incoming) in partial.0 {
            match (key.as_str(), incoming) {
                (FORM_FIELDS_KEY, Value::Object(fields)) => match self.0.get_mut(FORM_FIELDS_KEY) {
                    Some(Value::Object(existing)) => existing.extend(fields),
                    _ => {
                        self.0.insert(key, Value::Object(fields));
                    }
                },
                (_, value) => {
                    self.0.insert(key, value);
                }
            }
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
