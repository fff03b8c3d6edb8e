//! Configuration loader.
//!
//! Resolution order, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. The optional TOML file
//! 3. Environment variables
//!
//! `TAVILY_API_KEY`, `GEMINI_API_KEY` and `DATABASE_URL` must resolve to a
//! non-empty value or loading fails.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{AppConfig, FileSettings};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Load configuration from `path` (if given) and the process environment.
///
/// # Example
///
/// ```rust,no_run
/// use rk_core::config::load_config;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(None)?;
/// println!("Listening on port {}", config.server.port);
/// # Ok(())
/// # }
/// ```
pub fn load_config(path: Option<&Path>) -> ConfigResult<AppConfig> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load_config`], reading variables through `lookup`.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match path {
        Some(path) => read_file(path)?,
        None => FileSettings::default(),
    };
    let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let mut models = file.models;
    if let Some(analyst) = var("ANALYST_MODEL") {
        models.analyst = analyst;
    }
    if let Some(fast) = var("FAST_MODEL") {
        models.fast = fast;
    }

    let mut server = file.server;
    if let Some(host) = var("HOST") {
        server.host = host;
    }
    if let Some(port) = var("PORT") {
        server.port = parse_var("PORT", &port)?;
    }

    let config = AppConfig {
        tavily_api_key: var("TAVILY_API_KEY")
            .ok_or_else(|| ConfigError::MissingVar("TAVILY_API_KEY".to_string()))?,
        gemini_api_key: var("GEMINI_API_KEY")
            .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?,
        database_url: var("DATABASE_URL")
            .or(file.database_url.filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
        models,
        server,
        rate_limit: file.rate_limit,
        search: file.search,
    };
    validate(&config)?;
    Ok(config)
}

fn read_file(path: &Path) -> ConfigResult<FileSettings> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Loaded config file");
    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_var<T>(name: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
        name: name.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn validate(config: &AppConfig) -> ConfigResult<()> {
    if config.rate_limit.window_secs == 0 {
        return Err(ConfigError::Invalid(
            "rate_limit.window_secs must be greater than zero".to_string(),
        ));
    }
    if config.search.max_results == 0 {
        return Err(ConfigError::Invalid(
            "search.max_results must be greater than zero".to_string(),
        ));
    }
    if !matches!(config.search.depth.as_str(), "basic" | "advanced") {
        return Err(ConfigError::Invalid(format!(
            "search.depth must be \"basic\" or \"advanced\", got {:?}",
            config.search.depth
        )));
    }
    Ok(())
}
