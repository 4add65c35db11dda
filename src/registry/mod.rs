//! Store registry: the static dependency graph between stores
//!
//! Built once at startup and never mutated. Every other component uses it
//! to validate store ids and to find the dependents of a written store.

mod standard;

pub use standard::{ROOT_REQUIRED_FIELDS, ROOT_STORE};

use crate::error::{McpError, McpResult};
use crate::propagation::Guard;
use crate::store::StoreSchema;
use std::collections::{HashMap, VecDeque};

/// Description of one named store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Fixed store id
    pub store_id: String,

    /// Stores whose data this store's compute hook consumes
    pub dependencies: Vec<String>,

    /// Informational list of stores that depend on this one
    pub propagates_to: Vec<String>,

    /// Reference into the hook table, if the store is computed
    pub compute_hook: Option<String>,

    /// Condition on this store's data gating propagation from it
    pub guard: Option<Guard>,

    /// Shape checks applied to every write
    pub schema: StoreSchema,
}

impl RegistryEntry {
    /// A plain store with no dependencies
    pub fn new(store_id: &str) -> Self {
        Self {
            store_id: store_id.to_string(),
            dependencies: vec![],
            propagates_to: vec![],
            compute_hook: None,
            guard: None,
            schema: StoreSchema::any(),
        }
    }

    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.dependencies = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn propagates_to(mut self, ids: &[&str]) -> Self {
        self.propagates_to = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_hook(mut self, reference: &str) -> Self {
        self.compute_hook = Some(reference.to_string());
        self
    }

    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_schema(mut self, schema: StoreSchema) -> Self {
        self.schema = schema;
        self
    }
}

/// Validated, immutable set of registry entries
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
    order: Vec<String>,
    root: Option<String>,
}

impl Registry {
    /// Build a registry, rejecting duplicate ids, dangling references,
    /// inconsistent `propagates_to` lists and dependency cycles
    pub fn new(entries: Vec<RegistryEntry>) -> McpResult<Self> {
        let mut index = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.store_id.clone(), i).is_some() {
                return Err(McpError::RegistryInvalid(format!(
                    "duplicate store id '{}'",
                    entry.store_id
                )));
            }
        }

        for entry in &entries {
            for dep in &entry.dependencies {
                if !index.contains_key(dep) {
                    return Err(McpError::RegistryInvalid(format!(
                        "store '{}' depends on unknown store '{}'",
                        entry.store_id, dep
                    )));
                }
            }
            for target in &entry.propagates_to {
                let listed = index
                    .get(target)
                    .map(|&i| entries[i].dependencies.contains(&entry.store_id))
                    .unwrap_or(false);
                if !listed {
                    return Err(McpError::RegistryInvalid(format!(
                        "store '{}' propagates to '{}', which does not depend on it",
                        entry.store_id, target
                    )));
                }
            }
        }

        let order = topological_order(&entries, &index)?;

        Ok(Self {
            entries,
            index,
            order,
            root: None,
        })
    }

    /// Designate the root input store, whose form fields feed every
    /// computed store as basic data
    pub fn with_root(mut self, store_id: &str) -> McpResult<Self> {
        self.resolve(store_id)?;
        self.root = Some(store_id.to_string());
        Ok(self)
    }

    /// The fixed application registry
    pub fn standard() -> McpResult<Self> {
        standard::build()
    }

    /// Look up a store's entry
    pub fn resolve(&self, store_id: &str) -> McpResult<&RegistryEntry> {
        self.index
            .get(store_id)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| McpError::UnknownStore(store_id.to_string()))
    }

    pub fn contains(&self, store_id: &str) -> bool {
        self.index.contains_key(store_id)
    }

    /// Stores that list `store_id` among their dependencies, in registry order
    pub fn dependents(&self, store_id: &str) -> Vec<&RegistryEntry> {
        self.entries
            .iter()
            .filter(|e| e.dependencies.iter().any(|d| d == store_id))
            .collect()
    }

    /// Store ids in registry order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.store_id.as_str())
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Store ids ordered so every store follows all of its dependencies
    pub fn topological_order(&self) -> &[String] {
        &self.order
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Kahn's algorithm over the dependency edges; fails on a cycle
fn topological_order(
    entries: &[RegistryEntry],
    index: &HashMap<String, usize>,
) -> McpResult<Vec<String>> {
    let mut indegree: Vec<usize> = entries.iter().map(|e| e.dependencies.len()).collect();
    let mut dependents: Vec<Vec<usize>> = vec![vec![]; entries.len()];
    for (i, entry) in entries.iter().enumerate() {
        for dep in &entry.dependencies {
            dependents[index[dep]].push(i);
        }
    }

    let mut ready: VecDeque<usize> = (0..entries.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(entries.len());

    while let Some(i) = ready.pop_front() {
        order.push(entries[i].store_id.clone());
        for &d in &dependents[i] {
            indegree[d] -= 1;
            if indegree[d] == 0 {
                ready.push_back(d);
            }
        }
    }

    if order.len() != entries.len() {
        let cyclic: Vec<&str> = entries
            .iter()
            .enumerate()
            .filter(|(i, _)| indegree[*i] > 0)
            .map(|(_, e)| e.store_id.as_str())
            .collect();
        return Err(McpError::RegistryInvalid(format!(
            "dependency cycle among stores: {}",
            cyclic.join(", ")
        )));
    }

    Ok(order)
}
