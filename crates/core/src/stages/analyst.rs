//! Analyst stage: structured analysis of the research data.

use super::prompts::analyst_prompt;
use super::{stream_to_sink, ChunkSink, Stage, StageError};
use crate::services::LanguageModel;
use crate::state::{PartialState, PipelineState};
use async_trait::async_trait;
use rk_protocol::StageName;
use std::sync::Arc;

pub struct Analyst {
    model: Arc<dyn LanguageModel>,
}

impl Analyst {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Stage for Analyst {
    fn name(&self) -> StageName {
        StageName::Analyst
    }

    async fn run(&self, state: &PipelineState, sink: &ChunkSink) -> Result<PartialState, StageError> {
        let prompt = analyst_prompt(&state.query, &state.research_data);
        let analysis = stream_to_sink(self.model.as_ref(), &prompt, sink).await?;
        Ok(PartialState::analysis(analysis))
    }
}
