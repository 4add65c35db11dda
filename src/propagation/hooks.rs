//! Compute hook abstraction and the in-process dispatch table
//!
//! A compute hook maps an invocation payload to a result document. Hooks
//! are looked up by the reference named in a store's registry entry.

use crate::store::Document;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single hook invocation. Never fails the triggering write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("compute failed: {0}")]
    Application(String),

    #[error("compute hook unavailable: {0}")]
    Unavailable(String),
}

/// External computation run when a store's dependencies change
///
/// Implementations should be pure functions of the payload: running the
/// same payload twice must yield the same document.
#[async_trait]
pub trait ComputeHook: Send + Sync {
    /// Compute the result document for `payload`
    async fn compute(&self, payload: Document) -> Result<Document, HookError>;
}

/// Adapter turning a blocking closure into a [`ComputeHook`]
///
/// The closure runs on the blocking thread pool so a slow computation
/// cannot stall the runtime and the caller's timeout still applies.
pub struct FnHook<F> {
    func: Arc<F>,
}

impl<F> FnHook<F>
where
    F: Fn(Document) -> Result<Document, HookError> + Send + Sync + 'static,
{
    pub fn new(func: F) -> Self {
        Self {
            func: Arc::new(func),
        }
    }
}

#[async_trait]
impl<F> ComputeHook for FnHook<F>
where
    F: Fn(Document) -> Result<Document, HookError> + Send + Sync + 'static,
{
    async fn compute(&self, payload: Document) -> Result<Document, HookError> {
        let func = Arc::clone(&self.func);
        tokio::task::spawn_blocking(move || func(payload))
            .await
            .map_err(|e| HookError::Unavailable(format!("hook task failed: {}", e)))?
    }
}

/// Dispatch table from hook reference to implementation
#[derive(Clone, Default)]
pub struct HookTable {
    hooks: HashMap<String, Arc<dyn ComputeHook>>,
}

impl HookTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `hook` to `reference`, replacing any previous binding
    pub fn register(&mut self, reference: impl Into<String>, hook: Arc<dyn ComputeHook>) {
        self.hooks.insert(reference.into(), hook);
    }

    /// Builder form of [`HookTable::register`]
    pub fn with(mut self, reference: impl Into<String>, hook: impl ComputeHook + 'static) -> Self {
        self.register(reference, Arc::new(hook));
        self
    }

    /// Builder form for a plain closure
    pub fn with_fn<F>(self, reference: impl Into<String>, func: F) -> Self
    where
        F: Fn(Document) -> Result<Document, HookError> + Send + Sync + 'static,
    {
        self.with(reference, FnHook::new(func))
    }

    pub fn get(&self, reference: &str) -> Option<Arc<dyn ComputeHook>> {
        self.hooks.get(reference).cloned()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.hooks.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.hooks.keys().collect();
        names.sort();
        f.debug_struct("HookTable").field("hooks", &names).finish()
    }
}
