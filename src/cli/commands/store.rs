//! Store commands - get, set, patch, clear, export and import

use crate::cli::args::{ClearArgs, ExportArgs, GetArgs, ImportArgs, OutputFormat, WriteArgs};
use crate::cli::commands::{open_manager, print_report, read_document, read_file, write_output};
use crate::config::Config;
use crate::error::{McpError, McpResult};
use crate::manager::WriteOutcome;
use crate::store::Document;
use console::style;

/// Print a store's value, optionally with its version metadata
pub async fn get(args: GetArgs, config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;

    let output = if args.meta {
        serde_json::to_string_pretty(&manager.snapshot(&args.store).await?)?
    } else {
        serde_json::to_string_pretty(&manager.get(&args.store).await?)?
    };
    println!("{}", output);

    Ok(())
}

/// Replace a store's value
pub async fn set(args: WriteArgs, config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;
    let document = read_document(&args.document).await?;
    let outcome = manager.set(&args.store, document).await?;
    print_outcome(&outcome, args.format)
}

/// Merge a partial document into a store
pub async fn patch(args: WriteArgs, config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;
    let document = read_document(&args.document).await?;
    let outcome = manager.patch(&args.store, document).await?;
    print_outcome(&outcome, args.format)
}

/// Reset one store to an empty document
pub async fn clear(args: ClearArgs, config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;
    let outcome = manager.clear(&args.store).await?;
    println!(
        "{} Cleared {} (v{})",
        style("✓").green(),
        outcome.store_id,
        outcome.version
    );
    Ok(())
}

/// Reset every store to an empty document
pub async fn clear_all(config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;
    manager.clear_all().await?;
    println!(
        "{} Cleared {} store(s)",
        style("✓").green(),
        manager.registry().len()
    );
    Ok(())
}

/// Export one store with a timestamp
pub async fn export(args: ExportArgs, config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;
    let export = manager.export_store(&args.store).await?;
    let content = serde_json::to_string_pretty(&export)?;
    write_output(args.output.as_deref(), &content).await?;

    if let Some(path) = &args.output {
        eprintln!(
            "{} Exported {} to {}",
            style("✓").green(),
            args.store,
            path.display()
        );
    }
    Ok(())
}

/// Import a document or an export file into a store
pub async fn import(args: ImportArgs, config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;
    let content = read_file(&args.file).await?;
    let document = Document::parse(&content).map_err(|e| {
        McpError::User(format!("Invalid import file {}: {}", args.file.display(), e))
    })?;
    let outcome = manager.import_store(&args.store, document).await?;
    print_outcome(&outcome, OutputFormat::Table)
}

fn print_outcome(outcome: &WriteOutcome, format: OutputFormat) -> McpResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Plain => println!("{} {}", outcome.store_id, outcome.version),
        OutputFormat::Table => {
            println!(
                "{} Wrote {} (v{})",
                style("✓").green(),
                outcome.store_id,
                outcome.version
            );
            if let Some(report) = &outcome.propagation {
                print_report(report);
            }
        }
    }
    Ok(())
}
