//! Researcher stage: web search for the query.
//!
//! Search failures are absorbed. The stage then stores
//! [`RESEARCH_FAILED`] as `researchData` and the run continues, so the
//! report is written from whatever the later stages can do without sources.

use super::prompts::{format_results, RESEARCH_FAILED};
use super::{ChunkSink, Stage, StageError};
use crate::services::{SearchOptions, SearchProvider};
use crate::state::{Message, PartialState, PipelineState};
use async_trait::async_trait;
use rk_protocol::StageName;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Researcher {
    search: Arc<dyn SearchProvider>,
    options: SearchOptions,
}

impl Researcher {
    pub fn new(search: Arc<dyn SearchProvider>, options: SearchOptions) -> Self {
        Self { search, options }
    }
}

#[async_trait]
impl Stage for Researcher {
    fn name(&self) -> StageName {
        StageName::Researcher
    }

    async fn run(
        &self,
        state: &PipelineState,
        _sink: &ChunkSink,
    ) -> Result<PartialState, StageError> {
        match self.search.search(&state.query, &self.options).await {
            Ok(hits) => {
                info!(results = hits.len(), "Search completed");
                let results = format_results(&hits);
                let message =
                    Message::system(format!("Research completed. Foundry data:\n{}", results));
                Ok(PartialState::research(results, message))
            }
            Err(e) => {
                warn!(error = %e, "Search failed, continuing without sources");
                Ok(PartialState::research(
                    RESEARCH_FAILED,
                    Message::system("Research failed."),
                ))
            }
        }
    }
}
