//! Pipeline execution engine.
//!
//! The PipelineEngine runs the fixed stage sequence
//! `Researcher → Analyst → Writer`, folds each partial update into the
//! cumulative state, writes a checkpoint after every stage, and reports
//! progress as [`EngineEvent`]s.

pub mod events;

pub use events::EngineEvent;

use crate::stages::{ChunkSink, StageError, StageSet};
use crate::state::PipelineState;
use crate::store::{CheckpointStore, StoreError, StoredCheckpoint};
use rk_protocol::StageName;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, Sender};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

/// Buffer size of the channel behind [`PipelineEngine::run_stream`].
const EVENT_BUFFER: usize = 64;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{source}")]
    Stage {
        stage: StageName,
        #[source]
        source: StageError,
    },
    #[error("Failed to persist checkpoint: {0}")]
    Persistence(#[from] StoreError),
    #[error("No checkpoints found for run {0}")]
    NothingToResume(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

pub struct PipelineEngine {
    stages: StageSet,
    store: Arc<dyn CheckpointStore>,
}

impl PipelineEngine {
    /// Create an engine over `stages` that checkpoints into `store`.
    pub fn new(stages: StageSet, store: Arc<dyn CheckpointStore>) -> Self {
        Self { stages, store }
    }

    /// Execute a run from the first stage and return the final state.
    ///
    /// # Arguments
    ///
    /// * `initial` - State with the query set and everything else defaulted
    /// * `run_id` - Checkpoint partition key (the caller's thread id)
    /// * `events_tx` - Channel receiving the run's events
    ///
    /// # Errors
    ///
    /// A failing stage or checkpoint write halts the run. An
    /// [`EngineEvent::Error`] with the same message has already been sent
    /// when this returns `Err`.
    pub async fn run(
        &self,
        initial: PipelineState,
        run_id: &str,
        events_tx: Sender<EngineEvent>,
    ) -> PipelineResult<PipelineState> {
        info!(run_id, query = %initial.query, "Pipeline run started");
        self.run_from(initial, run_id, Some(StageName::Researcher), events_tx)
            .await
    }

    /// Spawn [`run`](Self::run) on the runtime and expose its events as a
    /// stream. The stream ends after the terminal event.
    pub fn run_stream(
        self: Arc<Self>,
        initial: PipelineState,
        run_id: String,
    ) -> ReceiverStream<EngineEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(async move {
            let _ = self.run(initial, &run_id, tx).await;
        });
        ReceiverStream::new(rx)
    }

    /// Continue a run from the stage after its latest checkpoint.
    ///
    /// A run whose latest checkpoint is the last stage completes immediately.
    pub async fn resume(
        &self,
        run_id: &str,
        events_tx: Sender<EngineEvent>,
    ) -> PipelineResult<PipelineState> {
        let Some(checkpoint) = self.store.latest(run_id).await? else {
            let err = PipelineError::NothingToResume(run_id.to_string());
            let _ = events_tx.send(EngineEvent::Error(err.to_string())).await;
            return Err(err);
        };
        info!(
            run_id,
            after = %checkpoint.stage,
            sequence = checkpoint.sequence,
            "Resuming pipeline run"
        );
        self.run_from(checkpoint.state, run_id, checkpoint.stage.next(), events_tx)
            .await
    }

    /// Final (or latest) state of a run, read back from the store.
    pub async fn get_state(&self, run_id: &str) -> PipelineResult<Option<PipelineState>> {
        Ok(self.store.latest_state(run_id).await?)
    }

    /// The stored checkpoint trail of a run.
    pub async fn history(&self, run_id: &str) -> PipelineResult<Vec<StoredCheckpoint>> {
        Ok(self.store.list(run_id).await?)
    }

    async fn run_from(
        &self,
        mut state: PipelineState,
        run_id: &str,
        first: Option<StageName>,
        events_tx: Sender<EngineEvent>,
    ) -> PipelineResult<PipelineState> {
        let mut next = first;

        while let Some(name) = next {
            let _ = events_tx.send(EngineEvent::StageStart(name)).await;
            info!(run_id, stage = %name, "Stage started");

            let sink = ChunkSink::new(name, events_tx.clone());
            let update = match self.stages.stage(name).run(&state, &sink).await {
                Ok(update) => update,
                Err(source) => {
                    let err = PipelineError::Stage {
                        stage: name,
                        source,
                    };
                    return Err(fail(run_id, err, &events_tx).await);
                }
            };

            state.apply(update.clone());
            if let Err(e) = self.store.append(run_id, name, &state).await {
                return Err(fail(run_id, e.into(), &events_tx).await);
            }

            let _ = events_tx
                .send(EngineEvent::StageEnd {
                    stage: name,
                    update,
                })
                .await;
            info!(run_id, stage = %name, "Stage completed");

            next = name.next();
        }

        let _ = events_tx.send(EngineEvent::Complete).await;
        info!(run_id, "Pipeline run completed");
        Ok(state)
    }
}

async fn fail(run_id: &str, err: PipelineError, events_tx: &Sender<EngineEvent>) -> PipelineError {
    error!(run_id, error = %err, "Pipeline run failed");
    let _ = events_tx.send(EngineEvent::Error(err.to_string())).await;
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::adapters::{MockModel, MockSearch};
    use crate::services::SearchOptions;
    use crate::store::InMemoryCheckpointStore;

    fn engine(writer: MockModel) -> PipelineEngine {
        let stages = StageSet::standard(
            Arc::new(MockSearch::with_hits(2)),
            SearchOptions::default(),
            Arc::new(MockModel::replying("analysis")),
            Arc::new(writer),
        );
        PipelineEngine::new(stages, Arc::new(InMemoryCheckpointStore::new()))
    }

    async fn drain(mut rx: mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_run_returns_merged_state() {
        let engine = engine(MockModel::replying("# Report"));
        let (tx, rx) = mpsc::channel(64);

        let state = engine
            .run(PipelineState::for_query("q"), "t1", tx)
            .await
            .unwrap();
        let events = drain(rx).await;

        assert_eq!(state.final_report, "# Report");
        assert_eq!(state.analysis_data, "analysis");
        assert_eq!(events.last(), Some(&EngineEvent::Complete));
        assert_eq!(engine.get_state("t1").await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_stage_error_message_is_verbatim() {
        let engine = engine(MockModel::failing("writer model offline"));
        let (tx, rx) = mpsc::channel(64);

        let err = engine
            .run(PipelineState::for_query("q"), "t1", tx)
            .await
            .unwrap_err();
        let events = drain(rx).await;

        assert_eq!(err.to_string(), "writer model offline");
        assert_eq!(
            events.last(),
            Some(&EngineEvent::Error("writer model offline".to_string()))
        );
        assert!(!events.contains(&EngineEvent::Complete));
        assert_eq!(engine.history("t1").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resume_without_checkpoints() {
        let engine = engine(MockModel::replying("r"));
        let (tx, rx) = mpsc::channel(4);
        let err = engine.resume("unknown", tx).await.unwrap_err();

        assert!(matches!(err, PipelineError::NothingToResume(_)));
        assert_eq!(
            drain(rx).await,
            vec![EngineEvent::Error("No checkpoints found for run unknown".to_string())]
        );
    }
}
