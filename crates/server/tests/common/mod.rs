//! Shared fixtures for gateway tests.
//!
//! Contexts are assembled from the in-crate mock services, so no test talks
//! to a real model, search API or database file.

use rk_core::config::{
    AppConfig, ModelSettings, RateLimitSettings, SearchSettings, ServerSettings,
};
use rk_core::engine::PipelineEngine;
use rk_core::moderation::ModerationGate;
use rk_core::services::adapters::{MockModel, MockSearch};
use rk_core::services::SearchOptions;
use rk_core::stages::StageSet;
use rk_core::store::{CheckpointStore, InMemoryCheckpointStore};
use rk_protocol::{ClientOp, ServerEvent, StartPayload};
use rk_server::rate_limit::{FixedWindowLimiter, RateLimiter};
use rk_server::{AppContext, Session};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const ALLOW: &str = "```json\n{\"isAllowed\": true}\n```";

#[allow(dead_code)]
pub fn test_config(max_requests: u32) -> AppConfig {
    AppConfig {
        tavily_api_key: "tvly-test".to_string(),
        gemini_api_key: "gm-test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        models: ModelSettings::default(),
        server: ServerSettings::default(),
        rate_limit: RateLimitSettings {
            max_requests,
            window_secs: 3600,
        },
        search: SearchSettings::default(),
    }
}

/// Services behind a test context.
pub struct Services {
    pub moderation: MockModel,
    pub search: MockSearch,
    pub analyst: MockModel,
    pub writer: MockModel,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            moderation: MockModel::replying(ALLOW),
            search: MockSearch::with_hits(3),
            analyst: MockModel::new(vec![
                "Themes: carbon pricing, ".to_string(),
                "adoption barriers.".to_string(),
            ]),
            writer: MockModel::new(vec![
                "# Climate Policy\n\n".to_string(),
                "Carbon pricing reduces emissions [1].\n".to_string(),
            ]),
        }
    }
}

pub struct TestGateway {
    pub ctx: Arc<AppContext>,
    pub store: Arc<dyn CheckpointStore>,
}

#[allow(dead_code)]
pub fn gateway(services: Services, max_requests: u32) -> TestGateway {
    let store: Arc<dyn CheckpointStore> = Arc::new(InMemoryCheckpointStore::new());
    let stages = StageSet::standard(
        Arc::new(services.search),
        SearchOptions::default(),
        Arc::new(services.analyst),
        Arc::new(services.writer),
    );
    let engine = Arc::new(PipelineEngine::new(stages, Arc::clone(&store)));
    let limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowLimiter::new(max_requests));
    let ctx = AppContext::from_parts(
        test_config(max_requests),
        engine,
        ModerationGate::new(Arc::new(services.moderation)),
        limiter,
    );
    TestGateway {
        ctx: Arc::new(ctx),
        store,
    }
}

#[allow(dead_code)]
pub fn start(query: &str, thread_id: &str) -> ClientOp {
    ClientOp::Start(StartPayload::new(query, thread_id))
}

/// Handle `op` on a fresh session for `identity` and return every event.
#[allow(dead_code)]
pub async fn run_op(ctx: &Arc<AppContext>, identity: &str, op: ClientOp) -> Vec<ServerEvent> {
    let (tx, rx) = mpsc::channel(16);
    let collector = tokio::spawn(collect(rx));
    let session = Session::new(Arc::clone(ctx), identity, tx);
    session.handle(op).await;
    drop(session);
    collector.await.unwrap()
}

/// Same as [`run_op`] for a raw text frame.
#[allow(dead_code)]
pub async fn run_frame(ctx: &Arc<AppContext>, identity: &str, frame: &str) -> Vec<ServerEvent> {
    let (tx, rx) = mpsc::channel(16);
    let collector = tokio::spawn(collect(rx));
    let session = Session::new(Arc::clone(ctx), identity, tx);
    session.handle_frame(frame).await;
    drop(session);
    collector.await.unwrap()
}

async fn collect(mut rx: mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Events with the legacy text channel (`thought`, `token`) removed.
#[allow(dead_code)]
pub fn structured(events: &[ServerEvent]) -> Vec<&ServerEvent> {
    events
        .iter()
        .filter(|e| !matches!(e, ServerEvent::Thought { .. } | ServerEvent::Token { .. }))
        .collect()
}

#[allow(dead_code)]
pub fn count_terminal(events: &[ServerEvent]) -> usize {
    events.iter().filter(|e| e.is_terminal()).count()
}
