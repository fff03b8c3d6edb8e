//! Durable checkpoint trail.
//!
//! Every completed stage appends one [`StoredCheckpoint`] under the run id.
//! Trails are append-only and never shared between runs, so writers never
//! need to coordinate across runs.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryCheckpointStore;
pub use sqlite::SqliteCheckpointStore;

use crate::state::PipelineState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rk_protocol::StageName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open checkpoint store: {0}")]
    Open(String),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to serialize pipeline state: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Corrupt checkpoint row: {0}")]
    Corrupt(String),
    #[error("Checkpoint store lock poisoned: {0}")]
    Lock(String),
    #[error("Checkpoint store task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One persisted snapshot of pipeline state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCheckpoint {
    pub id: String,
    pub run_id: String,
    /// 1-based position in the run's trail.
    pub sequence: i64,
    /// The stage that had just completed.
    pub stage: StageName,
    pub state: PipelineState,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Append a checkpoint for `run_id` taken after `stage` completed.
    async fn append(
        &self,
        run_id: &str,
        stage: StageName,
        state: &PipelineState,
    ) -> StoreResult<StoredCheckpoint>;

    /// The most recent checkpoint of `run_id`.
    async fn latest(&self, run_id: &str) -> StoreResult<Option<StoredCheckpoint>>;

    /// The whole trail of `run_id`, oldest first.
    async fn list(&self, run_id: &str) -> StoreResult<Vec<StoredCheckpoint>>;

    /// Connectivity probe.
    async fn ping(&self) -> StoreResult<()>;

    /// State of the most recent checkpoint of `run_id`.
    async fn latest_state(&self, run_id: &str) -> StoreResult<Option<PipelineState>> {
        Ok(self.latest(run_id).await?.map(|cp| cp.state))
    }
}
