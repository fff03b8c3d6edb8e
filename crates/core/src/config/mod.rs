//! Configuration loading and management.
//!
//! Settings come from an optional TOML file and the process environment;
//! environment values win. API credentials are only read from the
//! environment.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_with};
pub use models::{AppConfig, ModelSettings, RateLimitSettings, SearchSettings, ServerSettings};
