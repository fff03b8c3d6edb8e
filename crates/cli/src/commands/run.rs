use super::build_context;
use crate::render;
use color_eyre::eyre::eyre;
use rk_client::Projection;
use rk_protocol::{ClientOp, ServerEvent, StartPayload};
use rk_server::Session;
use std::path::Path;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identity used for the rate limiter when driving a run from the terminal.
const LOCAL_IDENTITY: &str = "local";

pub async fn run(
    config: Option<&Path>,
    query: String,
    thread: Option<String>,
) -> color_eyre::Result<()> {
    let ctx = build_context(config).await?;
    let thread = thread.unwrap_or_else(session_id);
    render::banner(&query, &thread);

    let (tx, mut rx) = mpsc::channel::<ServerEvent>(256);
    let session = Session::new(ctx.clone(), LOCAL_IDENTITY, tx);
    let payload = StartPayload::new(query.clone(), thread.clone());
    let driver = tokio::spawn(async move { session.handle(ClientOp::Start(payload)).await });

    let mut projection = Projection::new();
    projection.begin(query, thread);
    while let Some(event) = rx.recv().await {
        render::event(&event);
        projection.apply(&event);
        if event.is_terminal() {
            break;
        }
    }
    driver.await?;
    ctx.shutdown();

    render::summary(&projection);
    match projection.error {
        Some(message) => Err(eyre!(message)),
        None => Ok(()),
    }
}

fn session_id() -> String {
    format!("session-{}", Uuid::new_v4())
}
