//! Error types for the data manager
//!
//! All modules use `McpResult<T>` as their return type. Compute hook
//! failures use the separate [`crate::propagation::HookError`] because they
//! never fail the write that triggered them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for data manager operations
pub type McpResult<T> = Result<T, McpError>;

/// All errors that can occur in the data manager
#[derive(Error, Debug)]
pub enum McpError {
    // Validation errors
    #[error("Store '{0}' does not exist")]
    UnknownStore(String),

    #[error("Invalid document for store '{store}': {reason}")]
    InvalidDocument { store: String, reason: String },

    #[error("Invalid session id '{id}': {reason}")]
    InvalidSessionId { id: String, reason: String },

    // Registry errors
    #[error("Invalid store registry: {0}")]
    RegistryInvalid(String),

    // Persistence errors
    #[error("Failed to persist store '{store}': {reason}")]
    Persist { store: String, reason: String },

    #[error("Failed to persist session '{session}': {reason}")]
    SessionPersist { session: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // Session errors
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl McpError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid document error
    pub fn invalid_document(store: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Create a store persistence error
    pub fn persist(store: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Persist {
            store: store.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the caller's request was rejected before any state changed
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownStore(_) | Self::InvalidDocument { .. } | Self::InvalidSessionId { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownStore(_) => Some("Run: tts-mcp stores"),
            Self::SessionNotFound(_) => Some("Run: tts-mcp session list"),
            Self::InvalidSessionId { .. } => {
                Some("Use letters, digits, '-', '_' or '.' in session ids")
            }
            Self::Persist { .. } | Self::SessionPersist { .. } | Self::Database(_) => {
                Some("Check that the data directory is writable")
            }
            _ => None,
        }
    }
}
