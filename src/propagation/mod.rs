//! Propagation of store writes to dependent compute hooks

pub mod engine;
pub mod guard;
pub mod hooks;

pub use engine::{
    build_payload, DependentOutcome, DependentStatus, PropagationReport, SkipReason,
    MODULE_DATA_KEY,
};
pub use guard::Guard;
pub use hooks::{ComputeHook, FnHook, HookError, HookTable};
