//! Capability traits for the language model and the web search API.

use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio_stream::Stream;

/// Failure of an upstream call (search or model).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Service not configured: {0}")]
    NotConfigured(String),
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("{0}")]
    Api(String),
    #[error("Stream parsing error: {0}")]
    StreamParse(String),
    #[error("Empty response from {0}")]
    EmptyResponse(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Chunked model output.
pub type TextStream = Pin<Box<dyn Stream<Item = ServiceResult<String>> + Send>>;

/// A text-in, text-out language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier used in logs (for example `gemini-2.5-flash`).
    fn model_id(&self) -> &str;

    /// Single-shot completion.
    async fn complete(&self, prompt: &str) -> ServiceResult<String>;

    /// Chunked completion.
    ///
    /// The default yields the whole `complete` response as one chunk.
    async fn stream(&self, prompt: &str) -> ServiceResult<TextStream> {
        let text = self.complete(prompt).await?;
        Ok(Box::pin(tokio_stream::once(Ok(text))))
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub content: String,
}

impl SearchHit {
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
        }
    }
}

/// Search tuning passed through to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// `basic` or `advanced`.
    pub depth: String,
    pub max_results: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            depth: "advanced".to_string(),
            max_results: 5,
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Ordered hits for `query`, best first.
    async fn search(&self, query: &str, options: &SearchOptions) -> ServiceResult<Vec<SearchHit>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    struct EchoModel;

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn model_id(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str) -> ServiceResult<String> {
            Ok(format!("echo: {prompt}"))
        }
    }

    #[tokio::test]
    async fn test_default_stream_yields_single_chunk() {
        let model = EchoModel;
        let chunks: Vec<_> = model.stream("hi").await.unwrap().collect().await;
        assert_eq!(chunks, vec![Ok("echo: hi".to_string())]);
    }

    #[test]
    fn test_default_search_options() {
        let options = SearchOptions::default();
        assert_eq!(options.depth, "advanced");
        assert_eq!(options.max_results, 5);
    }

    #[test]
    fn test_api_error_message_is_verbatim() {
        let err = ServiceError::Api("quota exhausted".to_string());
        assert_eq!(err.to_string(), "quota exhausted");
    }
}
