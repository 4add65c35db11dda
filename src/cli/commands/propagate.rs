//! Propagate command - recompute a store's dependents on demand

use crate::cli::args::{OutputFormat, PropagateArgs};
use crate::cli::commands::{open_manager, print_report};
use crate::config::Config;
use crate::error::{McpError, McpResult};
use console::style;

/// Execute the propagate command
pub async fn execute(args: PropagateArgs, config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;

    let source = match args.store {
        Some(store) => store,
        None => manager
            .registry()
            .root()
            .map(str::to_string)
            .ok_or_else(|| McpError::User("No root store registered; name a store".to_string()))?,
    };

    let report = manager.propagate_from(&source).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            for id in report.updated() {
                println!("{}", id);
            }
        }
        OutputFormat::Table => {
            println!("{} Propagated from {}", style("→").cyan(), source);
            print_report(&report);
        }
    }

    Ok(())
}
