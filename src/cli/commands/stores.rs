//! Stores command - list stores with version and dependencies

use crate::cli::args::{OutputFormat, StoresArgs};
use crate::cli::commands::open_manager;
use crate::config::Config;
use crate::error::McpResult;
use crate::registry::Registry;
use crate::store::StoreRecord;
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct StoreRow<'a> {
    store_id: &'a str,
    version: u64,
    last_updated: Option<String>,
    dependencies: &'a [String],
    compute_hook: Option<&'a str>,
}

/// Execute the stores command
pub async fn execute(args: StoresArgs, config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;
    let records = manager.snapshots().await;
    let rows = rows(manager.registry(), &records);

    match args.format {
        OutputFormat::Table => print_table(&rows, manager.propagation_enabled()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}", row.store_id);
            }
        }
    }

    Ok(())
}

fn rows<'a>(registry: &'a Registry, records: &'a [StoreRecord]) -> Vec<StoreRow<'a>> {
    records
        .iter()
        .filter_map(|record| {
            let entry = registry.resolve(&record.store_id).ok()?;
            Some(StoreRow {
                store_id: &record.store_id,
                version: record.version,
                last_updated: record
                    .last_updated
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
                dependencies: &entry.dependencies,
                compute_hook: entry.compute_hook.as_deref(),
            })
        })
        .collect()
}

fn print_table(rows: &[StoreRow<'_>], propagation_enabled: bool) {
    println!(
        "{:<20} {:<8} {:<20} {:<30}",
        style("STORE").bold(),
        style("VERSION").bold(),
        style("UPDATED").bold(),
        style("DEPENDS ON").bold()
    );
    println!("{}", "-".repeat(80));

    for row in rows {
        let updated = row.last_updated.as_deref().unwrap_or("never");
        let deps = if row.dependencies.is_empty() {
            "-".to_string()
        } else {
            row.dependencies.join(", ")
        };
        println!(
            "{:<20} {:<8} {:<20} {:<30}",
            row.store_id, row.version, updated, deps
        );
    }

    println!();
    println!(
        "{} store(s), propagation {}",
        rows.len(),
        if propagation_enabled {
            style("enabled").green()
        } else {
            style("disabled").yellow()
        }
    );
}
