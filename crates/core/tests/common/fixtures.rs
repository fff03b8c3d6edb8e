//! Fixtures for building engines and collecting their events.

use rk_core::engine::{EngineEvent, PipelineEngine};
use rk_core::services::{LanguageModel, SearchOptions, SearchProvider};
use rk_core::stages::StageSet;
use rk_core::store::{CheckpointStore, InMemoryCheckpointStore};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::mock_services::{ScriptedModel, StaticSearch};

/// The markdown the default writer model produces.
#[allow(dead_code)]
pub const REPORT_CHUNKS: [&str; 3] = ["# Climate Policy\n\n", "## Findings\n", "Carbon pricing works [1]."];

/// Engine over the given services with an in-memory store.
#[allow(dead_code)]
pub fn engine_with(
    search: Arc<dyn SearchProvider>,
    analyst: Arc<dyn LanguageModel>,
    writer: Arc<dyn LanguageModel>,
    store: Arc<dyn CheckpointStore>,
) -> PipelineEngine {
    let stages = StageSet::standard(search, SearchOptions::default(), analyst, writer);
    PipelineEngine::new(stages, store)
}

/// Engine with three sources, a two-chunk analyst and the default report.
#[allow(dead_code)]
pub fn default_engine() -> PipelineEngine {
    engine_with(
        Arc::new(StaticSearch::with_sources(3)),
        Arc::new(ScriptedModel::new(&["Key themes: ", "pricing, adoption."])),
        Arc::new(ScriptedModel::new(&REPORT_CHUNKS)),
        Arc::new(InMemoryCheckpointStore::new()),
    )
}

/// Receive until every sender is dropped.
#[allow(dead_code)]
pub async fn drain(mut rx: mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}
