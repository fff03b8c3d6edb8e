//! Gemini client over the public REST API.
//!
//! Single-shot calls use `:generateContent`; chunked calls use
//! `:streamGenerateContent?alt=sse` and parse the server-sent `data:` lines.

use crate::services::base::{LanguageModel, ServiceError, ServiceResult, TextStream};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Model name (e.g., "gemini-2.5-flash").
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            ..Self::default()
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.0,
            max_output_tokens: 8192,
            timeout_secs: 120,
        }
    }
}

pub struct GeminiModel {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiModel {
    pub fn new(config: GeminiConfig) -> ServiceResult<Self> {
        if config.api_key.is_empty() {
            return Err(ServiceError::NotConfigured(
                "Gemini API key is empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    fn body(&self, prompt: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    async fn post(&self, url: String, prompt: &str) -> ServiceResult<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&self.body(prompt))
            .send()
            .await
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api(api_error_message(status.as_u16(), &text)));
        }
        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> ServiceResult<String> {
        debug!(model = %self.config.model, "generateContent");
        let response = self.post(self.build_url("generateContent"), prompt).await?;
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::StreamParse(e.to_string()))?;

        match parsed.text() {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(ServiceError::EmptyResponse(self.config.model.clone())),
        }
    }

    async fn stream(&self, prompt: &str) -> ServiceResult<TextStream> {
        debug!(model = %self.config.model, "streamGenerateContent");
        let url = format!("{}?alt=sse", self.build_url("streamGenerateContent"));
        let response = self.post(url, prompt).await?;
        let mut bytes = Box::pin(response.bytes_stream());

        let stream = async_stream::try_stream! {
            let mut buffer: Vec<u8> = Vec::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| ServiceError::Http(e.to_string()))?;
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    if let Some(text) = parse_sse_line(&line)? {
                        yield text;
                    }
                }
            }
            if !buffer.is_empty() {
                let line = String::from_utf8_lossy(&buffer).into_owned();
                if let Some(text) = parse_sse_line(&line)? {
                    yield text;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Extract the text carried by one SSE line, if any.
///
/// Comment lines, blank lines, non-`data:` fields and chunks without text
/// (e.g. the trailing usage-metadata chunk) yield `None`.
pub fn parse_sse_line(line: &str) -> ServiceResult<Option<String>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim_start();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let parsed: GenerateResponse = serde_json::from_str(data)
        .map_err(|e| ServiceError::StreamParse(format!("{} (line: {})", e, data)))?;
    if let Some(error) = parsed.error {
        return Err(ServiceError::Api(error.message));
    }
    Ok(parsed.text().filter(|t| !t.is_empty()))
}

fn api_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.is_empty() => format!("Gemini API returned HTTP {}", status),
        Err(_) => format!("Gemini API returned HTTP {}: {}", status, body),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ErrorDetail>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        Some(
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.max_output_tokens, 8192);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let result = GeminiModel::new(GeminiConfig::default());
        assert!(matches!(result, Err(ServiceError::NotConfigured(_))));
    }

    #[test]
    fn test_build_url() {
        let model = GeminiModel::new(GeminiConfig::new("key", "gemini-2.5-pro", 0.2)).unwrap();
        assert_eq!(
            model.build_url("generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let model = GeminiModel::new(GeminiConfig::new("key", "m", 0.2)).unwrap();
        let json = serde_json::to_value(model.body("hello")).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_parse_sse_text_chunk() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"Hel"},{"text":"lo"}],"role":"model"}}]}"#;
        assert_eq!(parse_sse_line(line).unwrap(), Some("Hello".to_string()));
    }

    #[test]
    fn test_parse_sse_ignores_non_data_lines() {
        assert_eq!(parse_sse_line("").unwrap(), None);
        assert_eq!(parse_sse_line(": keep-alive").unwrap(), None);
        assert_eq!(parse_sse_line("event: message").unwrap(), None);
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), None);
    }

    #[test]
    fn test_parse_sse_metadata_only_chunk() {
        let line = r#"data: {"candidates":[{"finishReason":"STOP"}],"usageMetadata":{}}"#;
        assert_eq!(parse_sse_line(line).unwrap(), None);
    }

    #[test]
    fn test_parse_sse_error_chunk() {
        let line = r#"data: {"error":{"code":429,"message":"Resource exhausted"}}"#;
        assert_eq!(
            parse_sse_line(line),
            Err(ServiceError::Api("Resource exhausted".to_string()))
        );
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid"}}"#;
        assert_eq!(api_error_message(400, body), "API key not valid");
        assert_eq!(api_error_message(503, ""), "Gemini API returned HTTP 503");
    }

    #[tokio::test]
    #[ignore] // Requires GEMINI_API_KEY
    async fn test_live_completion() {
        let key = std::env::var("GEMINI_API_KEY").unwrap();
        let model = GeminiModel::new(GeminiConfig::new(key, "gemini-2.5-flash", 0.0)).unwrap();
        let text = model.complete("Reply with the single word: pong").await.unwrap();
        assert!(!text.is_empty());
    }
}
