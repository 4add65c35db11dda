//! Whole-cache backups exchanged as plain JSON documents

use crate::error::McpResult;
use crate::manager::{DataManager, RestoreSummary};
use crate::store::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every store's value with the time it was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub backup_timestamp: DateTime<Utc>,
    pub stores: BTreeMap<String, Document>,
}

impl Backup {
    /// Capture the current value of every store
    pub async fn capture(manager: &DataManager) -> Self {
        Self {
            backup_timestamp: Utc::now(),
            stores: manager.snapshot_all().await,
        }
    }

    /// Write the backup's values back. Unknown store ids are skipped.
    pub async fn apply(self, manager: &DataManager) -> McpResult<RestoreSummary> {
        manager.restore_all(self.stores).await
    }
}
