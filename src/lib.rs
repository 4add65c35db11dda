//! TTS MCP - reactive multi-store data manager
//!
//! Keeps the named stores of the transformer test planning application in
//! memory, mirrors every write to durable storage, and recomputes dependent
//! stores through in-process compute hooks when their inputs change.

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod manager;
pub mod propagation;
pub mod registry;
pub mod session;
pub mod store;

pub use error::{McpError, McpResult};
pub use manager::{DataManager, ManagerOptions, WriteOutcome};
