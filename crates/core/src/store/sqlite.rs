//! SQLite-backed checkpoint store.
//!
//! The connection sits behind a blocking mutex and every statement runs on
//! the blocking thread pool, so a slow disk never stalls other sessions.

use super::{CheckpointStore, StoreError, StoreResult, StoredCheckpoint};
use crate::state::PipelineState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rk_protocol::StageName;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const SCHEMA_VERSION: i32 = 1;

pub struct SqliteCheckpointStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCheckpointStore {
    /// Open a store from a connection string.
    ///
    /// Accepted forms: `sqlite::memory:`, `sqlite://<path>`, `sqlite:<path>`
    /// and a bare filesystem path. Other URL schemes are rejected.
    pub fn open(url: &str) -> StoreResult<Self> {
        let url = url.trim();
        if url == "sqlite::memory:" || url == ":memory:" {
            return Self::from_connection(Connection::open_in_memory()?);
        }

        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if path.is_empty() {
            return Err(StoreError::Open("empty database path".to_string()));
        }
        if path.contains("://") {
            return Err(StoreError::Open(format!(
                "unsupported database URL scheme in {}",
                url
            )));
        }
        Self::open_at(path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Open(e.to_string()))?;
            }
        }
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Opened checkpoint database");
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|e| StoreError::Lock(e.to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        [],
    )?;
    let current: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    if current < 1 {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                id TEXT PRIMARY KEY,
                run_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                stage TEXT NOT NULL,
                state_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (run_id, seq)
            );
            CREATE INDEX IF NOT EXISTS idx_checkpoints_run ON checkpoints (run_id, seq);
            "#,
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        run_id: row.get(1)?,
        sequence: row.get(2)?,
        stage: row.get(3)?,
        state_json: row.get(4)?,
        created_at: row.get(5)?,
    })
}

struct RawRow {
    id: String,
    run_id: String,
    sequence: i64,
    stage: String,
    state_json: String,
    created_at: String,
}

impl RawRow {
    fn decode(self) -> StoreResult<StoredCheckpoint> {
        let stage = self
            .stage
            .parse::<StageName>()
            .map_err(|e| StoreError::Corrupt(format!("checkpoint {}: {}", self.id, e)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Corrupt(format!("checkpoint {}: {}", self.id, e)))?
            .with_timezone(&Utc);
        Ok(StoredCheckpoint {
            state: serde_json::from_str(&self.state_json)?,
            id: self.id,
            run_id: self.run_id,
            sequence: self.sequence,
            stage,
            created_at,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, run_id, seq, stage, state_json, created_at FROM checkpoints";

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn append(
        &self,
        run_id: &str,
        stage: StageName,
        state: &PipelineState,
    ) -> StoreResult<StoredCheckpoint> {
        let run_id = run_id.to_string();
        let state = state.clone();
        let state_json = serde_json::to_string(&state)?;

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let sequence: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM checkpoints WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )?;
            let id = uuid::Uuid::new_v4().to_string();
            let created_at = Utc::now();
            tx.execute(
                "INSERT INTO checkpoints (id, run_id, seq, stage, state_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    run_id,
                    sequence,
                    stage.as_str(),
                    state_json,
                    created_at.to_rfc3339()
                ],
            )?;
            tx.commit()?;
            debug!(run_id = %run_id, sequence, stage = %stage, "Checkpoint written");

            Ok(StoredCheckpoint {
                id,
                run_id,
                sequence,
                stage,
                state,
                created_at,
            })
        })
        .await
    }

    async fn latest(&self, run_id: &str) -> StoreResult<Option<StoredCheckpoint>> {
        let run_id = run_id.to_string();
        self.with_conn(move |conn| {
            let raw = conn
                .query_row(
                    &format!("{} WHERE run_id = ?1 ORDER BY seq DESC LIMIT 1", SELECT_COLUMNS),
                    params![run_id],
                    read_row,
                )
                .optional()?;
            raw.map(RawRow::decode).transpose()
        })
        .await
    }

    async fn list(&self, run_id: &str) -> StoreResult<Vec<StoredCheckpoint>> {
        let run_id = run_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare(&format!("{} WHERE run_id = ?1 ORDER BY seq ASC", SELECT_COLUMNS))?;
            let rows = stmt.query_map(params![run_id], read_row)?;
            let mut checkpoints = Vec::new();
            for raw in rows {
                checkpoints.push(raw?.decode()?);
            }
            Ok(checkpoints)
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }
}
