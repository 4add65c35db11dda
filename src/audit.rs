//! Audit trail of store and session events
//!
//! Appends one JSON line per [`AuditEvent`] to `audit.log` in the data
//! directory. Audit failures are logged and dropped; they never fail the
//! operation being audited.

use crate::config::{schema::Config, ConfigManager};
use crate::propagation::{PropagationReport, SkipReason};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Something worth keeping a durable trace of
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A single store was set, patched, cleared or updated by a hook
    StoreWrite {
        op: String,
        store: String,
        version: u64,
    },
    /// Every store was cleared in one transaction
    StoreClearAll { stores: usize },
    /// Stores were replaced in bulk from a session or backup
    StoreRestore {
        restored: Vec<String>,
        skipped: Vec<String>,
    },
    /// A propagation trigger finished
    Propagation {
        source: String,
        updated: Vec<String>,
        not_updated: Vec<String>,
        skipped: Option<SkipReason>,
    },
    SessionSave { session_id: String, stores: usize },
    SessionRestore { session_id: String, restored: usize },
}

impl AuditEvent {
    pub fn store_write(op: &str, store: &str, version: u64) -> Self {
        Self::StoreWrite {
            op: op.to_string(),
            store: store.to_string(),
            version,
        }
    }

    /// Summary of a propagation report
    pub fn propagation(report: &PropagationReport) -> Self {
        Self::Propagation {
            source: report.source.clone(),
            updated: report.updated().into_iter().map(str::to_string).collect(),
            not_updated: report.not_updated().into_iter().map(str::to_string).collect(),
            skipped: report.skipped.clone(),
        }
    }
}

#[derive(Serialize)]
struct AuditEntry<'a> {
    timestamp: String,
    #[serde(flatten)]
    event: &'a AuditEvent,
}

/// File-based audit logger that appends JSON lines
#[derive(Debug, Clone)]
pub struct AuditLog {
    enabled: bool,
    path: PathBuf,
}

impl AuditLog {
    /// Audit log in the configured data directory
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.audit_log,
            path: ConfigManager::data_dir(config).join("audit.log"),
        }
    }

    /// Audit logger that records nothing
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
        }
    }

    pub async fn record(&self, event: &AuditEvent) {
        if !self.enabled {
            return;
        }

        let entry = AuditEntry {
            timestamp: Utc::now().to_rfc3339(),
            event,
        };
        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize audit event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
