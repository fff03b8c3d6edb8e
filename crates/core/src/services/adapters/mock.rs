//! Offline service doubles.
//!
//! `MockModel` replays scripted chunks and records every prompt it receives;
//! `MockSearch` returns fixed hits. Both can be switched to fail.

use crate::services::base::{
    LanguageModel, SearchHit, SearchOptions, SearchProvider, ServiceError, ServiceResult,
    TextStream,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct MockModel {
    id: String,
    chunks: Vec<String>,
    error: Option<ServiceError>,
    latency: Option<Duration>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockModel {
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            id: "mock".to_string(),
            chunks,
            error: None,
            latency: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A model whose whole answer is `text`, delivered as one chunk.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()])
    }

    /// A model that fails every call with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(ServiceError::Api(message.into())),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Wait `latency` before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn record(&self, prompt: &str) -> ServiceResult<()> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    fn model_id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, prompt: &str) -> ServiceResult<String> {
        self.record(prompt)?;
        self.wait().await;
        Ok(self.chunks.concat())
    }

    async fn stream(&self, prompt: &str) -> ServiceResult<TextStream> {
        self.record(prompt)?;
        self.wait().await;
        let chunks: Vec<ServiceResult<String>> = self.chunks.iter().cloned().map(Ok).collect();
        Ok(Box::pin(tokio_stream::iter(chunks)))
    }
}

#[derive(Clone, Default)]
pub struct MockSearch {
    hits: Vec<SearchHit>,
    error: Option<ServiceError>,
}

impl MockSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits, error: None }
    }

    /// `count` synthetic hits on `example.com`.
    pub fn with_hits(count: usize) -> Self {
        Self::new(
            (1..=count)
                .map(|i| {
                    SearchHit::new(
                        format!("https://example.com/{i}"),
                        format!("Excerpt number {i}"),
                    )
                })
                .collect(),
        )
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            hits: Vec::new(),
            error: Some(ServiceError::Api(message.into())),
        }
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, _query: &str, options: &SearchOptions) -> ServiceResult<Vec<SearchHit>> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(self.hits.iter().take(options.max_results).cloned().collect())
    }
}
