//! CLI command implementations

pub mod config;
pub mod propagate;
pub mod session;
pub mod store;
pub mod stores;

pub use config::execute as config;
pub use propagate::execute as propagate;
pub use session::{backup, restore_backup, execute as session};
pub use stores::execute as stores;

use crate::config::Config;
use crate::error::{McpError, McpResult};
use crate::manager::DataManager;
use crate::propagation::{DependentStatus, HookTable, PropagationReport, SkipReason};
use crate::store::Document;
use console::style;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Open the data manager for a command.
///
/// The CLI binds no compute hooks, so computed dependents report as unbound.
pub(crate) async fn open_manager(config: &Config) -> McpResult<Arc<DataManager>> {
    Ok(Arc::new(DataManager::open(config, HookTable::new()).await?))
}

/// Read a document argument: inline JSON, `@path`, or `-` for stdin
pub(crate) async fn read_document(arg: &str) -> McpResult<Document> {
    let text = if arg == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|e| McpError::io("reading document from stdin", e))?;
        text
    } else if let Some(path) = arg.strip_prefix('@') {
        read_file(Path::new(path)).await?
    } else {
        arg.to_string()
    };

    Document::parse(&text).map_err(|e| McpError::User(format!("Invalid document: {}", e)))
}

pub(crate) async fn read_file(path: &Path) -> McpResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| McpError::io(format!("reading {}", path.display()), e))
}

/// Write `content` to `output`, or stdout when no path is given
pub(crate) async fn write_output(output: Option<&Path>, content: &str) -> McpResult<()> {
    match output {
        Some(path) => tokio::fs::write(path, content)
            .await
            .map_err(|e| McpError::io(format!("writing {}", path.display()), e)),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

/// Print a propagation report for humans
pub(crate) fn print_report(report: &PropagationReport) {
    match &report.skipped {
        Some(SkipReason::Disabled) => {
            println!("  {} propagation disabled", style("-").dim());
            return;
        }
        Some(SkipReason::GuardUnmet { missing }) => {
            println!(
                "  {} propagation skipped, missing: {}",
                style("!").yellow(),
                missing.join(", ")
            );
            return;
        }
        None => {}
    }

    if report.outcomes.is_empty() {
        println!("  {} no computed dependents", style("-").dim());
        return;
    }

    for outcome in &report.outcomes {
        let status = match &outcome.status {
            DependentStatus::Updated { version } => {
                style(format!("updated (v{})", version)).green()
            }
            DependentStatus::Failed { reason } => style(format!("failed: {}", reason)).red(),
            DependentStatus::TimedOut => style("timed out".to_string()).red(),
            DependentStatus::Unbound => style("no hook bound".to_string()).dim(),
        };
        println!("  {:<20} {}", outcome.store_id, status);
    }
}
