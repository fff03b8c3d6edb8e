//! Scripted service doubles for deterministic runs.

use async_trait::async_trait;
use rk_core::services::{
    LanguageModel, SearchHit, SearchOptions, SearchProvider, ServiceError, ServiceResult,
    TextStream,
};
use rk_core::state::PipelineState;
use rk_core::store::{CheckpointStore, StoreError, StoreResult, StoredCheckpoint};
use rk_protocol::StageName;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A model that streams fixed chunks and counts its calls.
#[allow(dead_code)]
pub struct ScriptedModel {
    pub chunks: Vec<String>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedModel {
    #[allow(dead_code)]
    pub fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _prompt: &str) -> ServiceResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.chunks.concat())
    }

    async fn stream(&self, _prompt: &str) -> ServiceResult<TextStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let chunks = self.chunks.clone();
        let stream = async_stream::stream! {
            for chunk in chunks {
                tokio::task::yield_now().await;
                yield Ok(chunk);
            }
        };
        Ok(Box::pin(stream))
    }
}

/// A model that emits some chunks and then fails mid-stream.
#[allow(dead_code)]
pub struct FailingModel {
    pub before_failure: Vec<String>,
    pub message: String,
}

impl FailingModel {
    #[allow(dead_code)]
    pub fn new(message: &str) -> Self {
        Self {
            before_failure: Vec::new(),
            message: message.to_string(),
        }
    }

    #[allow(dead_code)]
    pub fn after(chunks: &[&str], message: &str) -> Self {
        Self {
            before_failure: chunks.iter().map(|c| c.to_string()).collect(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for FailingModel {
    fn model_id(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _prompt: &str) -> ServiceResult<String> {
        Err(ServiceError::Api(self.message.clone()))
    }

    async fn stream(&self, _prompt: &str) -> ServiceResult<TextStream> {
        let chunks = self.before_failure.clone();
        let message = self.message.clone();
        let stream = async_stream::stream! {
            for chunk in chunks {
                yield Ok(chunk);
            }
            yield Err(ServiceError::Api(message));
        };
        Ok(Box::pin(stream))
    }
}

/// A search provider with fixed results.
#[allow(dead_code)]
pub struct StaticSearch {
    pub hits: Vec<SearchHit>,
}

impl StaticSearch {
    #[allow(dead_code)]
    pub fn with_sources(count: usize) -> Self {
        Self {
            hits: (1..=count)
                .map(|i| {
                    SearchHit::new(
                        format!("https://source{}.example/article", i),
                        format!("Finding {} about the topic.", i),
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _query: &str, options: &SearchOptions) -> ServiceResult<Vec<SearchHit>> {
        Ok(self.hits.iter().take(options.max_results).cloned().collect())
    }
}

/// A checkpoint store whose writes always fail.
#[allow(dead_code)]
pub struct BrokenStore;

#[async_trait]
impl CheckpointStore for BrokenStore {
    async fn append(
        &self,
        _run_id: &str,
        _stage: StageName,
        _state: &PipelineState,
    ) -> StoreResult<StoredCheckpoint> {
        Err(StoreError::Open("disk unavailable".to_string()))
    }

    async fn latest(&self, _run_id: &str) -> StoreResult<Option<StoredCheckpoint>> {
        Ok(None)
    }

    async fn list(&self, _run_id: &str) -> StoreResult<Vec<StoredCheckpoint>> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Open("disk unavailable".to_string()))
    }
}
