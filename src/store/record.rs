//! Versioned store records as held in memory and on disk

use crate::store::document::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One store's value plus its persistence metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Registry id of the store
    pub store_id: String,

    /// Current document
    pub value: Document,

    /// Number of successful persisted writes (0 = never written)
    pub version: u64,

    /// Time of the last persisted write
    pub last_updated: Option<DateTime<Utc>>,
}

impl StoreRecord {
    /// Record for a store that has never been written
    pub fn empty(store_id: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            value: Document::new(),
            version: 0,
            last_updated: None,
        }
    }

    /// The record that a successful write of `value` produces
    pub fn next(&self, value: Document) -> Self {
        Self {
            store_id: self.store_id.clone(),
            value,
            version: self.version + 1,
            last_updated: Some(Utc::now()),
        }
    }
}
