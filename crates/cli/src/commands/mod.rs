//! Subcommand implementations.

mod checkpoints;
mod resume;
mod run;
mod serve;

pub use checkpoints::checkpoints;
pub use resume::resume;
pub use run::run;
pub use serve::serve;

use color_eyre::eyre::eyre;
use rk_core::config::load_config;
use rk_server::AppContext;
use std::path::Path;
use std::sync::Arc;

/// Load configuration and wire the full gateway context.
async fn build_context(config: Option<&Path>) -> color_eyre::Result<Arc<AppContext>> {
    let config = load_config(config)?;
    let ctx = AppContext::build(config).await.map_err(|e| eyre!(e))?;
    Ok(Arc::new(ctx))
}
