//! Configuration models.

use serde::Deserialize;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_PORT: u16 = 3000;

/// Fully resolved process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tavily_api_key: String,
    pub gemini_api_key: String,
    /// Checkpoint database connection string.
    pub database_url: String,
    pub models: ModelSettings,
    pub server: ServerSettings,
    pub rate_limit: RateLimitSettings,
    pub search: SearchSettings,
}

/// The two model variants: a careful one for analysis and a fast one for
/// moderation and writing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSettings {
    pub analyst: String,
    pub fast: String,
    pub analyst_temperature: f32,
    pub fast_temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            analyst: DEFAULT_MODEL.to_string(),
            fast: DEFAULT_MODEL.to_string(),
            analyst_temperature: 0.0,
            fast_temperature: 0.2,
            max_output_tokens: 8192,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Fixed-window quota on run starts per caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    /// Every counter is cleared at this interval.
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 2,
            window_secs: 60 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    pub depth: String,
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            depth: "advanced".to_string(),
            max_results: 5,
        }
    }
}

/// Shape of the optional TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileSettings {
    pub database_url: Option<String>,
    pub models: ModelSettings,
    pub server: ServerSettings,
    pub rate_limit: RateLimitSettings,
    pub search: SearchSettings,
}
