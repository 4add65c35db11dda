//! Session records and their durable table

use crate::error::{McpError, McpResult};
use crate::store::Document;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Captured store values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
    /// Value of every store at capture time
    pub stores: BTreeMap<String, Document>,

    /// When the values were captured
    pub timestamp: DateTime<Utc>,
}

/// A named, point-in-time snapshot of all stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Caller-chosen session id
    pub session_id: String,

    /// Captured store values
    pub session_document: SessionDocument,

    /// When the session was saved
    pub created_at: DateTime<Utc>,

    /// Free-form description
    #[serde(default)]
    pub description: String,
}

impl SessionRecord {
    /// Create a record capturing `stores` now
    pub fn new(
        session_id: String,
        description: String,
        stores: BTreeMap<String, Document>,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            session_document: SessionDocument {
                stores,
                timestamp: now,
            },
            created_at: now,
            description,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            created_at: self.created_at,
            description: self.description.clone(),
        }
    }
}

/// Listing entry for a saved session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub description: String,
}

/// Durable storage for session records
#[async_trait]
pub trait SessionTable: Send + Sync {
    /// Insert or overwrite a session
    async fn put(&self, record: &SessionRecord) -> McpResult<()>;

    /// Load a session by id
    async fn get(&self, session_id: &str) -> McpResult<Option<SessionRecord>>;

    /// Load every readable session
    async fn list(&self) -> McpResult<Vec<SessionRecord>>;
}

/// Session ids name durable records, so they are limited to a safe
/// character set
pub fn validate_session_id(id: &str) -> McpResult<()> {
    let invalid = |reason: &str| McpError::InvalidSessionId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if id.len() > 128 {
        return Err(invalid("must be at most 128 characters"));
    }
    if id.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(invalid("may only contain letters, digits, '-', '_' and '.'"));
    }
    Ok(())
}
