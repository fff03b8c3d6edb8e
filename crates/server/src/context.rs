//! Process-wide gateway context.
//!
//! Created once at startup and shared by every connection. Owns the engine,
//! the moderation gate, the rate limiter and the limiter's reset ticker.

use crate::rate_limit::{spawn_reset_ticker, FixedWindowLimiter, RateLimiter};
use anyhow::Context as _;
use rk_core::config::AppConfig;
use rk_core::engine::PipelineEngine;
use rk_core::moderation::ModerationGate;
use rk_core::services::adapters::{GeminiConfig, GeminiModel, TavilyConfig, TavilySearch};
use rk_core::services::{LanguageModel, SearchOptions};
use rk_core::stages::StageSet;
use rk_core::store::{CheckpointStore, SqliteCheckpointStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

pub struct AppContext {
    pub config: AppConfig,
    pub engine: Arc<PipelineEngine>,
    pub moderation: ModerationGate,
    pub limiter: Arc<dyn RateLimiter>,
    reset_task: Mutex<Option<JoinHandle<()>>>,
}

impl AppContext {
    /// Wire the real upstream clients and open the checkpoint store.
    ///
    /// The store is probed before returning; an unreachable database fails
    /// startup.
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let models = &config.models;
        let analyst_model: Arc<dyn LanguageModel> = Arc::new(
            GeminiModel::new(GeminiConfig {
                max_output_tokens: models.max_output_tokens,
                timeout_secs: models.timeout_secs,
                ..GeminiConfig::new(
                    config.gemini_api_key.clone(),
                    models.analyst.clone(),
                    models.analyst_temperature,
                )
            })
            .context("Failed to create analyst model client")?,
        );
        let fast_model: Arc<dyn LanguageModel> = Arc::new(
            GeminiModel::new(GeminiConfig {
                max_output_tokens: models.max_output_tokens,
                timeout_secs: models.timeout_secs,
                ..GeminiConfig::new(
                    config.gemini_api_key.clone(),
                    models.fast.clone(),
                    models.fast_temperature,
                )
            })
            .context("Failed to create fast model client")?,
        );
        let search = Arc::new(
            TavilySearch::new(TavilyConfig::new(config.tavily_api_key.clone()))
                .context("Failed to create search client")?,
        );

        let store: Arc<dyn CheckpointStore> = Arc::new(
            SqliteCheckpointStore::open(&config.database_url)
                .context("Failed to open checkpoint database")?,
        );
        store
            .ping()
            .await
            .context("Checkpoint database did not answer")?;
        info!("Checkpoint database ready");

        let options = SearchOptions {
            depth: config.search.depth.clone(),
            max_results: config.search.max_results,
        };
        let stages = StageSet::standard(search, options, analyst_model, fast_model.clone());
        let engine = Arc::new(PipelineEngine::new(stages, store));
        let moderation = ModerationGate::new(fast_model);
        let limiter: Arc<dyn RateLimiter> =
            Arc::new(FixedWindowLimiter::new(config.rate_limit.max_requests));

        let ctx = Self::from_parts(config, engine, moderation, limiter);
        ctx.start_reset_ticker();
        Ok(ctx)
    }

    /// Assemble a context from ready-made parts. The reset ticker is not
    /// started.
    pub fn from_parts(
        config: AppConfig,
        engine: Arc<PipelineEngine>,
        moderation: ModerationGate,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            config,
            engine,
            moderation,
            limiter,
            reset_task: Mutex::new(None),
        }
    }

    /// Start clearing the limiter every configured window. Restarts the
    /// ticker if one is already running.
    pub fn start_reset_ticker(&self) {
        let period = Duration::from_secs(self.config.rate_limit.window_secs);
        let handle = spawn_reset_ticker(Arc::clone(&self.limiter), period);
        if let Ok(mut slot) = self.reset_task.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.reset_task
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Stop background work owned by the context.
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.reset_task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
                info!("Rate limit reset ticker stopped");
            }
        }
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
