//! Tavily web search client.

use crate::services::base::{SearchHit, SearchOptions, SearchProvider, ServiceError, ServiceResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TavilyConfig {
    pub api_key: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl TavilyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.tavily.com".to_string(),
            timeout_secs: 60,
        }
    }
}

pub struct TavilySearch {
    client: reqwest::Client,
    config: TavilyConfig,
}

impl TavilySearch {
    pub fn new(config: TavilyConfig) -> ServiceResult<Self> {
        if config.api_key.is_empty() {
            return Err(ServiceError::NotConfigured(
                "Tavily API key is empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str, options: &SearchOptions) -> ServiceResult<Vec<SearchHit>> {
        let url = format!("{}/search", self.config.endpoint.trim_end_matches('/'));
        let body = SearchRequest {
            api_key: &self.config.api_key,
            query,
            search_depth: &options.depth,
            max_results: options.max_results,
        };
        debug!(depth = %options.depth, max_results = options.max_results, "tavily search");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(ErrorBody::message)
                .unwrap_or_else(|| format!("Tavily API returned HTTP {}", status.as_u16()));
            return Err(ServiceError::Api(message));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::StreamParse(e.to_string()))?;
        Ok(parsed
            .results
            .into_iter()
            .map(|r| SearchHit::new(r.url, r.content))
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    url: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<ErrorDetail>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    error: String,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        self.detail.map(|d| d.error).or(self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let options = SearchOptions::default();
        let body = SearchRequest {
            api_key: "tvly-key",
            query: "climate policy",
            search_depth: &options.depth,
            max_results: options.max_results,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["search_depth"], "advanced");
        assert_eq!(json["max_results"], 5);
        assert_eq!(json["query"], "climate policy");
    }

    #[test]
    fn test_response_parsing_keeps_order() {
        let json = r#"{
            "query": "q",
            "results": [
                {"title": "A", "url": "https://a.example", "content": "alpha", "score": 0.9},
                {"title": "B", "url": "https://b.example", "content": "beta", "score": 0.8}
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let urls: Vec<_> = parsed.results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":{"error":"Unauthorized: missing or invalid API key."}}"#)
                .unwrap();
        assert_eq!(
            body.message().as_deref(),
            Some("Unauthorized: missing or invalid API key.")
        );
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(matches!(
            TavilySearch::new(TavilyConfig::default()),
            Err(ServiceError::NotConfigured(_))
        ));
    }
}
