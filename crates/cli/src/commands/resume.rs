use super::build_context;
use crate::render;
use rk_core::engine::EngineEvent;
use std::path::Path;
use tokio::sync::mpsc;

pub async fn resume(config: Option<&Path>, thread: &str) -> color_eyre::Result<()> {
    let ctx = build_context(config).await?;
    let engine = ctx.engine.clone();

    let (tx, mut rx) = mpsc::channel::<EngineEvent>(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            render::engine_event(&event);
        }
    });

    let outcome = engine.resume(thread, tx).await;
    printer.await?;
    ctx.shutdown();

    let state = outcome?;
    render::report(&state.final_report);
    Ok(())
}
