use color_eyre::eyre::eyre;
use rk_core::config::load_config;
use rk_server::AppContext;
use std::path::Path;
use std::sync::Arc;

pub async fn serve(config: Option<&Path>, port: Option<u16>) -> color_eyre::Result<()> {
    let mut config = load_config(config)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    let ctx = AppContext::build(config).await.map_err(|e| eyre!(e))?;
    rk_server::serve(Arc::new(ctx)).await.map_err(|e| eyre!(e))
}
