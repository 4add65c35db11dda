//! Durable tables for store records and sessions
//!
//! `SqliteTable` keeps both tables in one SQLite database under the data
//! directory:
//!
//! ```text
//! <data_dir>/tts-mcp.db
//!   stores   (store_id PK, value, last_updated, version)
//!   sessions (session_id PK, session_document, created_at, description)
//! ```
//!
//! The database runs in WAL mode with `synchronous = FULL`, so a write is on
//! disk once its transaction commits. Bulk writes share one transaction.

use crate::error::{McpError, McpResult};
use crate::session::state::{SessionDocument, SessionRecord, SessionTable};
use crate::store::document::Document;
use crate::store::record::StoreRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "tts-mcp.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS stores (
    store_id     TEXT PRIMARY KEY,
    value        TEXT NOT NULL,
    last_updated TEXT,
    version      INTEGER NOT NULL DEFAULT 1
);
CREATE TABLE IF NOT EXISTS sessions (
    session_id       TEXT PRIMARY KEY,
    session_document TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    description      TEXT NOT NULL DEFAULT ''
);
";

const UPSERT_STORE: &str = "
INSERT INTO stores (store_id, value, last_updated, version)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(store_id) DO UPDATE SET
    value = excluded.value,
    last_updated = excluded.last_updated,
    version = excluded.version
";

/// Durable storage for store records
#[async_trait]
pub trait StoreTable: Send + Sync {
    /// Load every readable record
    async fn load_all(&self) -> McpResult<Vec<StoreRecord>>;

    /// Insert or replace the record for `record.store_id`. Must be durable
    /// when it returns `Ok`.
    async fn upsert(&self, record: &StoreRecord) -> McpResult<()>;

    /// Insert or replace every record, all or nothing
    async fn upsert_all(&self, records: &[StoreRecord]) -> McpResult<()>;
}

/// SQLite-backed table for stores and sessions
#[derive(Debug, Clone)]
pub struct SqliteTable {
    path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTable {
    /// Open (and create if needed) the database in data directory `root`
    pub async fn open(root: impl Into<PathBuf>) -> McpResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| McpError::io(format!("creating directory {}", root.display()), e))?;

        let path = root.join(DATABASE_FILE);
        let db_path = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> McpResult<Connection> {
            let conn = Connection::open(&db_path)?;
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "FULL")?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|e| McpError::Internal(format!("database task failed: {}", e)))??;

        debug!("Opened database {}", path.display());
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Database file backing this table
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> McpResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> McpResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| McpError::Internal("database connection poisoned".to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| McpError::Internal(format!("database task failed: {}", e)))?
    }
}

fn upsert_store(conn: &Connection, record: &StoreRecord) -> McpResult<()> {
    let value = serde_json::to_string(&record.value)?;
    conn.execute(
        UPSERT_STORE,
        params![
            record.store_id,
            value,
            record.last_updated,
            record.version as i64
        ],
    )?;
    Ok(())
}

#[async_trait]
impl StoreTable for SqliteTable {
    async fn load_all(&self) -> McpResult<Vec<StoreRecord>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT store_id, value, last_updated, version FROM stores")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<DateTime<Utc>>>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?;

            let mut records = vec![];
            for row in rows {
                let (store_id, value, last_updated, version) = row?;
                match Document::parse(&value) {
                    Ok(value) => records.push(StoreRecord {
                        store_id,
                        value,
                        version: version.max(0) as u64,
                        last_updated,
                    }),
                    Err(e) => warn!("Skipping corrupt record for store {}: {}", store_id, e),
                }
            }
            Ok(records)
        })
        .await
    }

    async fn upsert(&self, record: &StoreRecord) -> McpResult<()> {
        let owned = record.clone();
        self.with_conn(move |conn| upsert_store(conn, &owned))
            .await
            .map_err(|e| McpError::persist(&record.store_id, e))?;

        debug!(
            "Persisted store {} at version {}",
            record.store_id, record.version
        );
        Ok(())
    }

    async fn upsert_all(&self, records: &[StoreRecord]) -> McpResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let owned = records.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            for record in &owned {
                upsert_store(&tx, record)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|e| {
            let ids: Vec<&str> = records.iter().map(|r| r.store_id.as_str()).collect();
            McpError::persist(ids.join(", "), e)
        })?;

        debug!("Persisted {} store(s) in one transaction", records.len());
        Ok(())
    }
}

fn session_from_row(
    session_id: String,
    document: &str,
    created_at: DateTime<Utc>,
    description: String,
) -> Option<SessionRecord> {
    match serde_json::from_str::<SessionDocument>(document) {
        Ok(session_document) => Some(SessionRecord {
            session_id,
            session_document,
            created_at,
            description,
        }),
        Err(e) => {
            warn!("Skipping corrupt session {}: {}", session_id, e);
            None
        }
    }
}

#[async_trait]
impl SessionTable for SqliteTable {
    async fn put(&self, record: &SessionRecord) -> McpResult<()> {
        let owned = record.clone();
        self.with_conn(move |conn| {
            let document = serde_json::to_string(&owned.session_document)?;
            conn.execute(
                "INSERT INTO sessions (session_id, session_document, created_at, description)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(session_id) DO UPDATE SET
                     session_document = excluded.session_document,
                     created_at = excluded.created_at,
                     description = excluded.description",
                params![owned.session_id, document, owned.created_at, owned.description],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| McpError::SessionPersist {
            session: record.session_id.clone(),
            reason: e.to_string(),
        })
    }

    async fn get(&self, session_id: &str) -> McpResult<Option<SessionRecord>> {
        let id = session_id.to_string();
        let row = self
            .with_conn(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT session_document, created_at, description
                         FROM sessions WHERE session_id = ?1",
                        params![id],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, DateTime<Utc>>(1)?,
                                row.get::<_, String>(2)?,
                            ))
                        },
                    )
                    .optional()?)
            })
            .await?;

        let Some((document, created_at, description)) = row else {
            return Ok(None);
        };
        let session_document = serde_json::from_str(&document)?;
        Ok(Some(SessionRecord {
            session_id: session_id.to_string(),
            session_document,
            created_at,
            description,
        }))
    }

    async fn list(&self) -> McpResult<Vec<SessionRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, session_document, created_at, description FROM sessions",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, DateTime<Utc>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?;

            let mut records = vec![];
            for row in rows {
                let (id, document, created_at, description) = row?;
                records.extend(session_from_row(id, &document, created_at, description));
            }
            Ok(records)
        })
        .await
    }
}
