//! Store access API over the in-memory cache
//!
//! `DataManager` is the only entry point to store values. One mutex guards
//! the whole cache, so every read sees fully committed writes and writes to
//! any stores are totally ordered. A write is persisted while the lock is
//! held and only then replaces the cached record; propagation and compute
//! hooks run after the lock is released.

use crate::audit::{AuditEvent, AuditLog};
use crate::config::{Config, ConfigManager};
use crate::error::{McpError, McpResult};
use crate::propagation::{engine, HookTable, PropagationReport};
use crate::registry::Registry;
use crate::store::{Document, SqliteTable, StoreRecord, StoreTable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Runtime knobs for a [`DataManager`]
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Whether writes fan out to dependents automatically
    pub propagation_enabled: bool,

    /// Upper bound for a single compute hook invocation
    pub hook_timeout: Duration,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            propagation_enabled: true,
            hook_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&Config> for ManagerOptions {
    fn from(config: &Config) -> Self {
        Self {
            propagation_enabled: config.propagation.enabled,
            hook_timeout: Duration::from_millis(config.propagation.hook_timeout_ms),
        }
    }
}

/// Result of a successful write
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub store_id: String,

    /// Version persisted by this write
    pub version: u64,

    /// Downstream recomputation summary; `None` for writes that never
    /// propagate (clears and hook write-backs)
    pub propagation: Option<PropagationReport>,
}

/// Result of a bulk restore from a session or backup
#[derive(Debug, Clone, Serialize)]
pub struct RestoreSummary {
    /// Stores whose values were replaced, in registry order
    pub restored: Vec<String>,

    /// Ids in the snapshot that were not restored (unknown or invalid)
    pub skipped: Vec<String>,

    /// One report per propagation trigger run after the restore
    pub propagation: Vec<PropagationReport>,
}

/// Single store export, as produced by [`DataManager::export_store`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreExport {
    pub store_id: String,
    pub data: Document,
    pub exported_at: DateTime<Utc>,
}

enum WriteOp {
    Replace(Document),
    Merge(Document),
    Clear,
}

impl WriteOp {
    fn name(&self) -> &'static str {
        match self {
            WriteOp::Replace(_) => "set",
            WriteOp::Merge(_) => "patch",
            WriteOp::Clear => "clear",
        }
    }
}

/// Reactive multi-store data manager
pub struct DataManager {
    registry: Registry,
    table: Arc<dyn StoreTable>,
    hooks: HookTable,
    cache: Mutex<HashMap<String, StoreRecord>>,
    propagation_enabled: AtomicBool,
    hook_timeout: Duration,
    audit: AuditLog,
}

impl DataManager {
    /// Build a manager and load every registered store from `table`.
    ///
    /// Stores missing from the table start empty at version 0. Records for
    /// ids that are not registered are ignored.
    pub async fn load(
        registry: Registry,
        table: Arc<dyn StoreTable>,
        hooks: HookTable,
        options: ManagerOptions,
        audit: AuditLog,
    ) -> McpResult<Self> {
        let mut cache: HashMap<String, StoreRecord> = registry
            .ids()
            .map(|id| (id.to_string(), StoreRecord::empty(id)))
            .collect();

        let mut loaded = 0;
        for record in table.load_all().await? {
            match cache.get_mut(&record.store_id) {
                Some(slot) => {
                    *slot = record;
                    loaded += 1;
                }
                None => warn!("Ignoring persisted record for unknown store {}", record.store_id),
            }
        }
        info!(
            "Loaded {} of {} store(s) from durable storage",
            loaded,
            registry.len()
        );

        Ok(Self {
            registry,
            table,
            hooks,
            cache: Mutex::new(cache),
            propagation_enabled: AtomicBool::new(options.propagation_enabled),
            hook_timeout: options.hook_timeout,
            audit,
        })
    }

    /// Open the standard registry over the configured data directory
    pub async fn open(config: &Config, hooks: HookTable) -> McpResult<Self> {
        let data_dir = ConfigManager::data_dir(config);
        let table = SqliteTable::open(&data_dir).await?;
        debug!("Using data directory {}", data_dir.display());

        Self::load(
            Registry::standard()?,
            Arc::new(table),
            hooks,
            ManagerOptions::from(config),
            AuditLog::new(config),
        )
        .await
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn hooks(&self) -> &HookTable {
        &self.hooks
    }

    pub fn hook_timeout(&self) -> Duration {
        self.hook_timeout
    }

    /// Current value of a store (a copy)
    pub async fn get(&self, store_id: &str) -> McpResult<Document> {
        Ok(self.snapshot(store_id).await?.value)
    }

    /// Current record of a store including version metadata
    pub async fn snapshot(&self, store_id: &str) -> McpResult<StoreRecord> {
        self.registry.resolve(store_id)?;
        let cache = self.cache.lock().await;
        cache
            .get(store_id)
            .cloned()
            .ok_or_else(|| McpError::Internal(format!("store {} missing from cache", store_id)))
    }

    /// Records of every store, in registry order
    pub async fn snapshots(&self) -> Vec<StoreRecord> {
        let cache = self.cache.lock().await;
        self.registry
            .ids()
            .filter_map(|id| cache.get(id).cloned())
            .collect()
    }

    /// Copy of every store's value
    pub async fn snapshot_all(&self) -> BTreeMap<String, Document> {
        let cache = self.cache.lock().await;
        cache
            .iter()
            .map(|(id, record)| (id.clone(), record.value.clone()))
            .collect()
    }

    /// Alias of [`DataManager::snapshot_all`]
    pub async fn get_all(&self) -> BTreeMap<String, Document> {
        self.snapshot_all().await
    }

    /// Replace a store's value, persist it, then propagate
    pub async fn set(&self, store_id: &str, value: Document) -> McpResult<WriteOutcome> {
        self.write(store_id, WriteOp::Replace(value), true).await
    }

    /// Merge a partial document into a store, persist it, then propagate.
    /// See [`Document::merge`] for the merge policy.
    pub async fn patch(&self, store_id: &str, partial: Document) -> McpResult<WriteOutcome> {
        self.write(store_id, WriteOp::Merge(partial), true).await
    }

    /// Reset a store to an empty document. Does not propagate.
    pub async fn clear(&self, store_id: &str) -> McpResult<WriteOutcome> {
        self.write(store_id, WriteOp::Clear, false).await
    }

    /// Clear every store in one transaction. On a persistence failure no
    /// store changes, on disk or in memory. Does not propagate.
    pub async fn clear_all(&self) -> McpResult<()> {
        let cleared = {
            let mut cache = self.cache.lock().await;
            let next: Vec<StoreRecord> = self
                .registry
                .ids()
                .filter_map(|id| cache.get(id).map(|current| current.next(Document::new())))
                .collect();

            self.table.upsert_all(&next).await?;
            let cleared = next.len();
            for record in next {
                cache.insert(record.store_id.clone(), record);
            }
            cleared
        };

        info!("Cleared all {} store(s)", cleared);
        self.audit
            .record(&AuditEvent::StoreClearAll { stores: cleared })
            .await;
        Ok(())
    }

    /// Switch automatic propagation on
    pub fn enable_propagation(&self) {
        self.propagation_enabled.store(true, Ordering::SeqCst);
        info!("Automatic propagation enabled");
    }

    /// Switch automatic propagation off; writes still persist
    pub fn disable_propagation(&self) {
        self.propagation_enabled.store(false, Ordering::SeqCst);
        info!("Automatic propagation disabled");
    }

    pub fn propagation_enabled(&self) -> bool {
        self.propagation_enabled.load(Ordering::SeqCst)
    }

    /// Run one propagation trigger from `store_id` now, regardless of the
    /// enable flag. The store's guard still applies.
    pub async fn propagate_from(&self, store_id: &str) -> McpResult<PropagationReport> {
        let current = self.get(store_id).await?;
        Ok(self.run_propagation(store_id, &current, true).await)
    }

    /// Export one store with a timestamp
    pub async fn export_store(&self, store_id: &str) -> McpResult<StoreExport> {
        Ok(StoreExport {
            store_id: store_id.to_string(),
            data: self.get(store_id).await?,
            exported_at: Utc::now(),
        })
    }

    /// Import a document into a store. Accepts either a raw document or an
    /// export wrapper carrying the document under `data`.
    pub async fn import_store(&self, store_id: &str, document: Document) -> McpResult<WriteOutcome> {
        let value = match document.get("data") {
            Some(Value::Object(data)) => Document::from(data.clone()),
            _ => document,
        };
        self.set(store_id, value).await
    }

    /// Replace many stores at once, then run one propagation pass.
    ///
    /// All matching stores are persisted in one transaction under a single
    /// lock acquisition; a persistence failure leaves every store as it was.
    /// Propagation then runs from the root store if it was restored,
    /// otherwise from every restored store.
    pub async fn restore_all(
        &self,
        stores: BTreeMap<String, Document>,
    ) -> McpResult<RestoreSummary> {
        let mut restored = vec![];
        let mut skipped = vec![];

        {
            let mut cache = self.cache.lock().await;
            let mut next_records = vec![];
            for (id, value) in &stores {
                let entry = match self.registry.resolve(id) {
                    Ok(entry) => entry,
                    Err(_) => {
                        warn!("Skipping unknown store {} during restore", id);
                        skipped.push(id.clone());
                        continue;
                    }
                };
                if let Err(e) = entry.schema.validate(id, value) {
                    warn!("Skipping store {} during restore: {}", id, e);
                    skipped.push(id.clone());
                    continue;
                }

                let next = match cache.get(id) {
                    Some(current) => current.next(value.clone()),
                    None => StoreRecord::empty(id.as_str()).next(value.clone()),
                };
                next_records.push(next);
            }

            self.table.upsert_all(&next_records).await?;
            for record in next_records {
                restored.push(record.store_id.clone());
                cache.insert(record.store_id.clone(), record);
            }
        }

        let order: Vec<&str> = self.registry.ids().collect();
        restored.sort_by_key(|id| order.iter().position(|o| *o == id.as_str()));

        info!("Restored {} store(s)", restored.len());
        self.audit
            .record(&AuditEvent::StoreRestore {
                restored: restored.clone(),
                skipped: skipped.clone(),
            })
            .await;

        let sources: Vec<&str> = match self.registry.root() {
            Some(root) if restored.iter().any(|id| id == root) => vec![root],
            _ => restored.iter().map(String::as_str).collect(),
        };

        let mut propagation = vec![];
        for source in sources {
            // restored values, not whatever a hook has written since
            let Some(value) = stores.get(source) else {
                continue;
            };
            propagation.push(self.run_propagation(source, value, false).await);
        }

        Ok(RestoreSummary {
            restored,
            skipped,
            propagation,
        })
    }

    pub(crate) fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Run one propagation trigger and audit its summary
    async fn run_propagation(
        &self,
        source: &str,
        committed: &Document,
        force: bool,
    ) -> PropagationReport {
        let report = engine::propagate(self, source, committed, force).await;
        if !report.outcomes.is_empty() {
            self.audit.record(&AuditEvent::propagation(&report)).await;
        }
        report
    }

    /// Values of `ids` read under a single lock acquisition
    pub(crate) async fn read_many(&self, ids: &[&str]) -> HashMap<String, Document> {
        let cache = self.cache.lock().await;
        ids.iter()
            .filter_map(|id| cache.get(*id).map(|r| (id.to_string(), r.value.clone())))
            .collect()
    }

    /// Merge a hook result into a dependent without propagating further
    pub(crate) async fn write_result(&self, store_id: &str, partial: Document) -> McpResult<u64> {
        let outcome = self.write(store_id, WriteOp::Merge(partial), false).await?;
        Ok(outcome.version)
    }

    async fn write(&self, store_id: &str, op: WriteOp, propagate: bool) -> McpResult<WriteOutcome> {
        let entry = self.registry.resolve(store_id)?;
        let op_name = op.name();

        let (version, committed) = {
            let mut cache = self.cache.lock().await;
            let current = cache
                .get(store_id)
                .ok_or_else(|| McpError::Internal(format!("store {} missing from cache", store_id)))?;

            let value = match op {
                WriteOp::Replace(value) => value,
                WriteOp::Merge(partial) => {
                    let mut value = current.value.clone();
                    value.merge(partial);
                    value
                }
                WriteOp::Clear => Document::new(),
            };
            entry.schema.validate(store_id, &value)?;

            let next = current.next(value);
            self.table.upsert(&next).await?;
            let committed = propagate.then(|| next.value.clone());
            let version = next.version;
            cache.insert(store_id.to_string(), next);
            (version, committed)
        };

        debug!("{} {} -> version {}", op_name, store_id, version);
        self.audit
            .record(&AuditEvent::store_write(op_name, store_id, version))
            .await;

        let propagation = match committed {
            Some(value) => Some(self.run_propagation(store_id, &value, false).await),
            None => None,
        };

        Ok(WriteOutcome {
            store_id: store_id.to_string(),
            version,
            propagation,
        })
    }
}
