//! Process-local checkpoint store.

use super::{CheckpointStore, StoreResult, StoredCheckpoint};
use crate::state::PipelineState;
use async_trait::async_trait;
use chrono::Utc;
use rk_protocol::StageName;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct InMemoryCheckpointStore {
    runs: Mutex<HashMap<String, Vec<StoredCheckpoint>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn append(
        &self,
        run_id: &str,
        stage: StageName,
        state: &PipelineState,
    ) -> StoreResult<StoredCheckpoint> {
        let mut runs = self.runs.lock().await;
        let trail = runs.entry(run_id.to_string()).or_default();
        let checkpoint = StoredCheckpoint {
            id: uuid::Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            sequence: trail.len() as i64 + 1,
            stage,
            state: state.clone(),
            created_at: Utc::now(),
        };
        trail.push(checkpoint.clone());
        Ok(checkpoint)
    }

    async fn latest(&self, run_id: &str) -> StoreResult<Option<StoredCheckpoint>> {
        let runs = self.runs.lock().await;
        Ok(runs.get(run_id).and_then(|trail| trail.last().cloned()))
    }

    async fn list(&self, run_id: &str) -> StoreResult<Vec<StoredCheckpoint>> {
        let runs = self.runs.lock().await;
        Ok(runs.get(run_id).cloned().unwrap_or_default())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_runs_are_isolated() {
        let store = InMemoryCheckpointStore::new();
        store
            .append("t1", StageName::Researcher, &PipelineState::new("one"))
            .await
            .unwrap();
        store
            .append("t2", StageName::Researcher, &PipelineState::new("two"))
            .await
            .unwrap();
        let second = store
            .append("t1", StageName::Analyst, &PipelineState::new("one"))
            .await
            .unwrap();

        assert_eq!(second.sequence, 2);
        assert_eq!(store.list("t1").await.unwrap().len(), 2);
        assert_eq!(
            store.latest_state("t2").await.unwrap().unwrap().query,
            "two"
        );
        assert!(store.latest("missing").await.unwrap().is_none());
    }
}
