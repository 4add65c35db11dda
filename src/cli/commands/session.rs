//! Session commands - save, restore and list sessions; backups

use crate::cli::args::{BackupArgs, OutputFormat, RestoreBackupArgs, SessionAction, SessionArgs};
use crate::cli::commands::{open_manager, print_report, read_file, write_output};
use crate::config::Config;
use crate::error::{McpError, McpResult};
use crate::manager::RestoreSummary;
use crate::session::{Backup, SessionManager, SessionSummary};
use console::style;

/// Execute a session subcommand
pub async fn execute(args: SessionArgs, config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;
    let sessions = SessionManager::open(config, manager).await?;

    match args.action {
        SessionAction::Save { id, description } => {
            let id = id.unwrap_or_else(generate_session_id);
            let summary = sessions.save(&id, &description).await?;
            println!(
                "{} Saved session {}",
                style("✓").green(),
                style(&summary.session_id).cyan()
            );
        }
        SessionAction::Restore { id } => {
            let outcome = sessions.restore(&id).await?;
            println!(
                "{} Restored session {}",
                style("✓").green(),
                style(&outcome.session_id).cyan()
            );
            print_summary(&outcome.summary);
        }
        SessionAction::List { format } => {
            let list = sessions.list().await?;
            print_sessions(&list, format)?;
        }
    }

    Ok(())
}

/// Write a backup of every store
pub async fn backup(args: BackupArgs, config: &Config) -> McpResult<()> {
    let manager = open_manager(config).await?;
    let backup = Backup::capture(&manager).await;
    let content = serde_json::to_string_pretty(&backup)?;
    write_output(args.output.as_deref(), &content).await?;

    if let Some(path) = &args.output {
        eprintln!(
            "{} Backed up {} store(s) to {}",
            style("✓").green(),
            backup.stores.len(),
            path.display()
        );
    }
    Ok(())
}

/// Restore every store from a backup file
pub async fn restore_backup(args: RestoreBackupArgs, config: &Config) -> McpResult<()> {
    let content = read_file(&args.file).await?;
    let backup: Backup = serde_json::from_str(&content).map_err(|e| {
        McpError::User(format!("Invalid backup file {}: {}", args.file.display(), e))
    })?;

    let manager = open_manager(config).await?;
    let summary = backup.apply(&manager).await?;
    println!(
        "{} Restored backup {}",
        style("✓").green(),
        style(args.file.display()).dim()
    );
    print_summary(&summary);

    Ok(())
}

fn generate_session_id() -> String {
    format!(
        "session-{}",
        &uuid::Uuid::new_v4().simple().to_string()[..8]
    )
}

fn print_summary(summary: &RestoreSummary) {
    println!("  {} store(s) restored", summary.restored.len());
    if !summary.skipped.is_empty() {
        println!(
            "  {} skipped: {}",
            style("!").yellow(),
            summary.skipped.join(", ")
        );
    }
    for report in &summary.propagation {
        println!("  {} from {}", style("→").cyan(), report.source);
        print_report(report);
    }
}

fn print_sessions(sessions: &[SessionSummary], format: OutputFormat) -> McpResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(sessions)?),
        OutputFormat::Plain => {
            for s in sessions {
                println!("{}", s.session_id);
            }
        }
        OutputFormat::Table => {
            if sessions.is_empty() {
                println!("No saved sessions.");
                return Ok(());
            }

            println!(
                "{:<30} {:<20} {}",
                style("SESSION").bold(),
                style("CREATED").bold(),
                style("DESCRIPTION").bold()
            );
            println!("{}", "-".repeat(80));
            for s in sessions {
                println!(
                    "{:<30} {:<20} {}",
                    s.session_id,
                    s.created_at.format("%Y-%m-%d %H:%M:%S"),
                    s.description
                );
            }
        }
    }
    Ok(())
}
