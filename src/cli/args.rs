//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// TTS MCP - reactive multi-store data manager
///
/// Reads and writes the persisted stores of the transformer test planning
/// application, and saves or restores whole sessions.
#[derive(Parser, Debug)]
#[command(name = "tts-mcp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TTS_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory (overrides storage.data_dir)
    #[arg(long, global = true, env = "TTS_MCP_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Disable automatic propagation for this invocation
    #[arg(long, global = true)]
    pub no_propagate: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stores with version and dependencies
    Stores(StoresArgs),

    /// Print a store's value
    Get(GetArgs),

    /// Replace a store's value
    Set(WriteArgs),

    /// Merge a partial document into a store
    Patch(WriteArgs),

    /// Reset a store to an empty document
    Clear(ClearArgs),

    /// Reset every store to an empty document
    ClearAll,

    /// Export a store with a timestamp
    Export(ExportArgs),

    /// Import a document or export file into a store
    Import(ImportArgs),

    /// Recompute a store's dependents now
    Propagate(PropagateArgs),

    /// Save, restore or list sessions
    Session(SessionArgs),

    /// Write a backup of every store
    Backup(BackupArgs),

    /// Restore every store from a backup file
    RestoreBackup(RestoreBackupArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the stores command
#[derive(Parser, Debug)]
pub struct StoresArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Store id
    pub store: String,

    /// Include version metadata
    #[arg(long)]
    pub meta: bool,
}

/// Arguments for the set and patch commands
#[derive(Parser, Debug)]
pub struct WriteArgs {
    /// Store id
    pub store: String,

    /// JSON object, `@path` to read a file, or `-` for stdin
    pub document: String,

    /// Output format for the write summary
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the clear command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Store id
    pub store: String,
}

/// Arguments for the export command
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Store id
    pub store: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the import command
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Store id
    pub store: String,

    /// File holding a document or an export
    pub file: PathBuf,
}

/// Arguments for the propagate command
#[derive(Parser, Debug)]
pub struct PropagateArgs {
    /// Source store (defaults to the root input store)
    pub store: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the session command
#[derive(Parser, Debug)]
pub struct SessionArgs {
    /// Subcommand for sessions
    #[command(subcommand)]
    pub action: SessionAction,
}

/// Session subcommands
#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// Save the current state of every store
    Save {
        /// Session id (auto-generated if not provided)
        id: Option<String>,

        /// Description stored with the session
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Restore a saved session
    Restore {
        /// Session id
        id: String,
    },

    /// List saved sessions
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

/// Arguments for the backup command
#[derive(Parser, Debug)]
pub struct BackupArgs {
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the restore-backup command
#[derive(Parser, Debug)]
pub struct RestoreBackupArgs {
    /// Backup file
    pub file: PathBuf,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., propagation.enabled)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
