//! TTS MCP - reactive multi-store data manager
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tts_mcp::cli::{commands, Cli, Commands};
use tts_mcp::config::{Config, ConfigManager};
use tts_mcp::error::McpResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> McpResult<()> {
    let mut cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let file_config = config_manager.load().await?;

    init_logging(cli.verbose, &file_config.general.log_format);
    debug!("Loaded config from {}", config_manager.path().display());

    // Config edits persist the file's values, not this invocation's overrides
    if let Commands::Config(args) = cli.command {
        return commands::config(args, &file_config, &config_manager).await;
    }

    let config = apply_overrides(file_config, cli.data_dir.take(), cli.no_propagate);

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Stores(args) => commands::stores(args, &config).await,
        Commands::Get(args) => commands::store::get(args, &config).await,
        Commands::Set(args) => commands::store::set(args, &config).await,
        Commands::Patch(args) => commands::store::patch(args, &config).await,
        Commands::Clear(args) => commands::store::clear(args, &config).await,
        Commands::ClearAll => commands::store::clear_all(&config).await,
        Commands::Export(args) => commands::store::export(args, &config).await,
        Commands::Import(args) => commands::store::import(args, &config).await,
        Commands::Propagate(args) => commands::propagate(args, &config).await,
        Commands::Session(args) => commands::session(args, &config).await,
        Commands::Backup(args) => commands::backup(args, &config).await,
        Commands::RestoreBackup(args) => commands::restore_backup(args, &config).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, log_format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("tts_mcp=warn"),
        1 => EnvFilter::new("tts_mcp=info"),
        _ => EnvFilter::new("tts_mcp=debug"),
    };

    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }
}

fn apply_overrides(mut config: Config, data_dir: Option<PathBuf>, no_propagate: bool) -> Config {
    if data_dir.is_some() {
        config.storage.data_dir = data_dir;
    }
    if no_propagate {
        config.propagation.enabled = false;
    }
    config
}
