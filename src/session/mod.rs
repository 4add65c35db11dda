//! Session snapshots and backups

pub mod backup;
pub mod manager;
pub mod state;

pub use backup::Backup;
pub use manager::{RestoreOutcome, SessionManager};
pub use state::{SessionRecord, SessionSummary, SessionTable};
