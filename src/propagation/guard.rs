//! Guard conditions gating propagation from a store

use crate::store::Document;
use serde_json::Value;

/// Fields that must be populated in one section of a store before its
/// dependents are recomputed.
///
/// A field counts as populated when it is present, not null, and not a
/// blank string. Form inputs arrive incrementally, so an unmet guard is an
/// expected outcome rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    section: String,
    required: Vec<String>,
}

impl Guard {
    /// Require `fields` to be populated inside the `section` sub-map
    pub fn required_fields(section: &str, fields: &[&str]) -> Self {
        Self {
            section: section.to_string(),
            required: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Names of required fields that are not populated in `doc`
    pub fn missing(&self, doc: &Document) -> Vec<String> {
        let section = doc.section(&self.section);
        self.required
            .iter()
            .filter(|field| !is_populated(section.get(field)))
            .cloned()
            .collect()
    }

    /// Whether every required field is populated
    pub fn is_met(&self, doc: &Document) -> bool {
        self.missing(doc).is_empty()
    }
}

fn is_populated(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
