//! Session save, restore and listing

use crate::audit::AuditEvent;
use crate::config::{Config, ConfigManager};
use crate::error::{McpError, McpResult};
use crate::manager::{DataManager, RestoreSummary};
use crate::session::state::{validate_session_id, SessionRecord, SessionSummary, SessionTable};
use crate::store::SqliteTable;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Result of restoring a session
#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    pub session_id: String,
    #[serde(flatten)]
    pub summary: RestoreSummary,
}

/// Session manager captures and restores whole-cache snapshots
pub struct SessionManager {
    manager: Arc<DataManager>,
    table: Arc<dyn SessionTable>,
}

impl SessionManager {
    /// Create a session manager over an explicit table
    pub fn new(manager: Arc<DataManager>, table: Arc<dyn SessionTable>) -> Self {
        Self { manager, table }
    }

    /// Create a session manager over the configured data directory
    pub async fn open(config: &Config, manager: Arc<DataManager>) -> McpResult<Self> {
        let table = SqliteTable::open(ConfigManager::data_dir(config)).await?;
        Ok(Self::new(manager, Arc::new(table)))
    }

    /// Capture every store's value under `session_id`, overwriting any
    /// previous session with the same id
    pub async fn save(&self, session_id: &str, description: &str) -> McpResult<SessionSummary> {
        validate_session_id(session_id)?;

        let stores = self.manager.snapshot_all().await;
        let count = stores.len();
        let record = SessionRecord::new(session_id.to_string(), description.to_string(), stores);
        self.table.put(&record).await?;

        info!("Saved session: {}", session_id);
        self.manager
            .audit()
            .record(&AuditEvent::SessionSave {
                session_id: session_id.to_string(),
                stores: count,
            })
            .await;
        Ok(record.summary())
    }

    /// Load a session's values back into the stores and recompute
    /// dependents against the restored state
    pub async fn restore(&self, session_id: &str) -> McpResult<RestoreOutcome> {
        let record = self.get(session_id).await?;
        let summary = self
            .manager
            .restore_all(record.session_document.stores)
            .await?;

        info!(
            "Restored session {} ({} store(s))",
            session_id,
            summary.restored.len()
        );
        self.manager
            .audit()
            .record(&AuditEvent::SessionRestore {
                session_id: session_id.to_string(),
                restored: summary.restored.len(),
            })
            .await;
        Ok(RestoreOutcome {
            session_id: session_id.to_string(),
            summary,
        })
    }

    /// Get a session by id
    pub async fn get(&self, session_id: &str) -> McpResult<SessionRecord> {
        validate_session_id(session_id)?;
        self.table
            .get(session_id)
            .await?
            .ok_or_else(|| McpError::SessionNotFound(session_id.to_string()))
    }

    /// List saved sessions, newest first
    pub async fn list(&self) -> McpResult<Vec<SessionSummary>> {
        let mut sessions: Vec<SessionSummary> = self
            .table
            .list()
            .await?
            .iter()
            .map(SessionRecord::summary)
            .collect();

        sessions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(sessions)
    }
}
