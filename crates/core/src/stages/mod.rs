//! Stage functions.
//!
//! Each stage reads the cumulative [`PipelineState`] and returns a
//! [`PartialState`]. Stages backed by a streaming model call forward every
//! chunk through the [`ChunkSink`] as it arrives.

pub mod analyst;
pub mod prompts;
pub mod researcher;
pub mod writer;

pub use analyst::Analyst;
pub use researcher::Researcher;
pub use writer::Writer;

use crate::engine::EngineEvent;
use crate::services::{LanguageModel, SearchOptions, SearchProvider, ServiceError};
use crate::state::{PartialState, PipelineState};
use async_trait::async_trait;
use rk_protocol::StageName;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// An upstream call failed; the message is surfaced verbatim.
    #[error(transparent)]
    Upstream(#[from] ServiceError),
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> StageName;

    async fn run(&self, state: &PipelineState, sink: &ChunkSink)
        -> Result<PartialState, StageError>;
}

/// Forwards model output chunks of one stage to the engine's event channel.
#[derive(Clone)]
pub struct ChunkSink {
    stage: StageName,
    tx: mpsc::Sender<EngineEvent>,
}

impl ChunkSink {
    pub fn new(stage: StageName, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { stage, tx }
    }

    /// Send one chunk. A closed channel is ignored; the run keeps going.
    pub async fn emit(&self, text: impl Into<String>) {
        let _ = self
            .tx
            .send(EngineEvent::ContentChunk {
                stage: self.stage,
                text: text.into(),
            })
            .await;
    }
}

/// Stream `prompt` through `model`, forwarding every chunk and returning the
/// concatenated text.
pub(crate) async fn stream_to_sink(
    model: &dyn LanguageModel,
    prompt: &str,
    sink: &ChunkSink,
) -> Result<String, ServiceError> {
    let mut stream = model.stream(prompt).await?;
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if chunk.is_empty() {
            continue;
        }
        text.push_str(&chunk);
        sink.emit(chunk).await;
    }
    Ok(text)
}

/// The three stages in run order.
#[derive(Clone)]
pub struct StageSet {
    researcher: Arc<dyn Stage>,
    analyst: Arc<dyn Stage>,
    writer: Arc<dyn Stage>,
}

impl StageSet {
    pub fn new(researcher: Arc<dyn Stage>, analyst: Arc<dyn Stage>, writer: Arc<dyn Stage>) -> Self {
        Self {
            researcher,
            analyst,
            writer,
        }
    }

    /// Researcher over `search`, Analyst on `analyst_model`, Writer on
    /// `fast_model`.
    pub fn standard(
        search: Arc<dyn SearchProvider>,
        options: SearchOptions,
        analyst_model: Arc<dyn LanguageModel>,
        fast_model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self::new(
            Arc::new(Researcher::new(search, options)),
            Arc::new(Analyst::new(analyst_model)),
            Arc::new(Writer::new(fast_model)),
        )
    }

    pub fn stage(&self, name: StageName) -> &Arc<dyn Stage> {
        match name {
            StageName::Researcher => &self.researcher,
            StageName::Analyst => &self.analyst,
            StageName::Writer => &self.writer,
        }
    }
}
