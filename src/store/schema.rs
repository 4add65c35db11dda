//! Per-store document checks applied at the access boundary

use crate::error::{McpError, McpResult};
use crate::store::document::Document;
use serde_json::Value;

/// Shape constraints for one store's documents.
///
/// Every listed section must be a JSON object when present. Unlisted keys
/// are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSchema {
    object_sections: Vec<String>,
}

impl StoreSchema {
    /// Schema that accepts any object
    pub fn any() -> Self {
        Self::default()
    }

    /// Schema requiring the given sections to be objects when present
    pub fn with_object_sections(sections: &[&str]) -> Self {
        Self {
            object_sections: sections.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn object_sections(&self) -> &[String] {
        &self.object_sections
    }

    /// Validate a document for `store_id`
    pub fn validate(&self, store_id: &str, doc: &Document) -> McpResult<()> {
        for section in &self.object_sections {
            match doc.get(section) {
                None | Some(Value::Object(_)) => {}
                Some(_) => {
                    return Err(McpError::invalid_document(
                        store_id,
                        format!("section '{}' must be an object", section),
                    ));
                }
            }
        }
        Ok(())
    }
}
