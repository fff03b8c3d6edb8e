//! Writer stage: renders the final markdown report.

use super::prompts::writer_prompt;
use super::{stream_to_sink, ChunkSink, Stage, StageError};
use crate::services::LanguageModel;
use crate::state::{PartialState, PipelineState};
use async_trait::async_trait;
use rk_protocol::StageName;
use std::sync::Arc;

pub struct Writer {
    model: Arc<dyn LanguageModel>,
}

impl Writer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Stage for Writer {
    fn name(&self) -> StageName {
        StageName::Writer
    }

    async fn run(&self, state: &PipelineState, sink: &ChunkSink) -> Result<PartialState, StageError> {
        let prompt = writer_prompt(&state.query, &state.analysis_data);
        let report = stream_to_sink(self.model.as_ref(), &prompt, sink).await?;
        Ok(PartialState::report(report))
    }
}
