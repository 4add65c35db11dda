//! Fan-out of a store write to the compute hooks of its direct dependents
//!
//! Each trigger runs `Guard-Check -> Fan-Out` once. Propagation is single
//! level: results written back into a dependent do not trigger that
//! dependent's own dependents. Hooks run without the cache lock held, so a
//! hook may itself read or write stores.

use crate::manager::DataManager;
use crate::registry::{Registry, RegistryEntry};
use crate::store::{Document, BASIC_DATA_KEY, FORM_FIELDS_KEY, INPUTS_KEY, RESULTS_KEY};
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Payload key carrying the dependent's own inputs
pub const MODULE_DATA_KEY: &str = "moduleData";

/// Why a trigger did not fan out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Automatic propagation is switched off
    Disabled,
    /// The written store's guard condition is not met yet
    GuardUnmet { missing: Vec<String> },
}

/// Result of recomputing one dependent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DependentStatus {
    /// Hook result written back at this version
    Updated { version: u64 },
    /// Hook or write-back failed; the store is unchanged
    Failed { reason: String },
    /// Hook exceeded the configured timeout; the store is unchanged
    TimedOut,
    /// The hook reference is not bound in the hook table
    Unbound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependentOutcome {
    pub store_id: String,
    #[serde(flatten)]
    pub status: DependentStatus,
}

impl DependentOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self.status, DependentStatus::Updated { .. })
    }
}

/// Summary of one propagation trigger, reported next to the write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    /// Store whose write triggered propagation
    pub source: String,

    /// Set when fan-out did not run
    pub skipped: Option<SkipReason>,

    /// One entry per dependent with a compute hook, in registry order
    pub outcomes: Vec<DependentOutcome>,
}

impl PropagationReport {
    fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            skipped: None,
            outcomes: vec![],
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Ids of dependents whose stores were updated
    pub fn updated(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_updated())
            .map(|o| o.store_id.as_str())
            .collect()
    }

    /// Ids of dependents that were not updated
    pub fn not_updated(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_updated())
            .map(|o| o.store_id.as_str())
            .collect()
    }

    pub fn outcome(&self, store_id: &str) -> Option<&DependentStatus> {
        self.outcomes
            .iter()
            .find(|o| o.store_id == store_id)
            .map(|o| &o.status)
    }
}

/// Build the hook payload for `dependent` from current store values.
///
/// `moduleData` is the dependent's own inputs and `basicData` the root
/// store's form fields, whether or not the root is a direct dependency.
/// Every other dependency contributes its results under its own id.
pub fn build_payload(
    registry: &Registry,
    dependent: &RegistryEntry,
    values: &HashMap<String, Document>,
) -> Document {
    let section = |store_id: &str, key: &str| -> Value {
        values
            .get(store_id)
            .map(|doc| doc.section(key))
            .unwrap_or_default()
            .into_value()
    };

    let mut payload = Document::new();
    payload.insert(MODULE_DATA_KEY, section(&dependent.store_id, INPUTS_KEY));
    let basic = match registry.root() {
        Some(root) => section(root, FORM_FIELDS_KEY),
        None => Value::Object(Default::default()),
    };
    payload.insert(BASIC_DATA_KEY, basic);

    for dep in &dependent.dependencies {
        if registry.root() != Some(dep.as_str()) {
            payload.insert(dep.clone(), section(dep, RESULTS_KEY));
        }
    }

    payload
}

/// Partial document written back into a dependent after a successful hook
pub fn result_patch(result: Document, payload: &Document) -> Document {
    let mut patch = Document::new();
    patch.insert(RESULTS_KEY, result.into_value());
    patch.insert(INPUTS_KEY, payload.section(MODULE_DATA_KEY).into_value());
    patch.insert(BASIC_DATA_KEY, payload.section(BASIC_DATA_KEY).into_value());
    patch
}

/// Run one propagation trigger from `source`, whose committed value is
/// `committed`. The guard is evaluated against that value, not a later read.
///
/// `force` bypasses the global enable flag (manual trigger) but never the
/// guard condition.
pub(crate) async fn propagate(
    manager: &DataManager,
    source: &str,
    committed: &Document,
    force: bool,
) -> PropagationReport {
    let mut report = PropagationReport::new(source);

    if !force && !manager.propagation_enabled() {
        debug!("Propagation disabled, skipping fan-out from {}", source);
        report.skipped = Some(SkipReason::Disabled);
        return report;
    }

    let registry = manager.registry();
    let guard = registry.resolve(source).ok().and_then(|e| e.guard.as_ref());
    if let Some(guard) = guard {
        let missing = guard.missing(committed);
        if !missing.is_empty() {
            info!(
                "Guard not met for {} (missing: {}), skipping propagation",
                source,
                missing.join(", ")
            );
            report.skipped = Some(SkipReason::GuardUnmet { missing });
            return report;
        }
    }

    let targets: Vec<(&RegistryEntry, &str)> = registry
        .dependents(source)
        .into_iter()
        .filter_map(|d| d.compute_hook.as_deref().map(|hook| (d, hook)))
        .collect();

    if targets.is_empty() {
        debug!("No computed dependents of {}", source);
        return report;
    }

    info!(
        "Propagating from {} to {} dependent(s)",
        source,
        targets.len()
    );

    report.outcomes = join_all(
        targets
            .into_iter()
            .map(|(dependent, hook)| recompute(manager, dependent, hook)),
    )
    .await;

    report
}

async fn recompute(manager: &DataManager, dependent: &RegistryEntry, hook_ref: &str) -> DependentOutcome {
    let store_id = dependent.store_id.clone();

    let Some(hook) = manager.hooks().get(hook_ref) else {
        debug!("Hook '{}' for {} is not bound", hook_ref, store_id);
        return DependentOutcome {
            store_id,
            status: DependentStatus::Unbound,
        };
    };

    let mut ids: Vec<&str> = vec![dependent.store_id.as_str()];
    ids.extend(dependent.dependencies.iter().map(String::as_str));
    ids.extend(manager.registry().root());
    let values = manager.read_many(&ids).await;
    let payload = build_payload(manager.registry(), dependent, &values);

    debug!("Invoking hook '{}' for {}", hook_ref, store_id);
    let status = match tokio::time::timeout(manager.hook_timeout(), hook.compute(payload.clone())).await {
        Err(_) => {
            warn!(
                "Hook '{}' for {} timed out after {:?}",
                hook_ref,
                store_id,
                manager.hook_timeout()
            );
            DependentStatus::TimedOut
        }
        Ok(Err(e)) => {
            warn!("Hook '{}' for {} failed: {}", hook_ref, store_id, e);
            DependentStatus::Failed {
                reason: e.to_string(),
            }
        }
        Ok(Ok(result)) => match manager
            .write_result(&store_id, result_patch(result, &payload))
            .await
        {
            Ok(version) => DependentStatus::Updated { version },
            Err(e) => {
                warn!("Failed to store result for {}: {}", store_id, e);
                DependentStatus::Failed {
                    reason: e.to_string(),
                }
            }
        },
    };

    DependentOutcome { store_id, status }
}
