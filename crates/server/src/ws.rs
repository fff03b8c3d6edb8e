//! WebSocket transport for sessions.
//!
//! Each text frame in either direction is one JSON object
//! `{"type": ..., "payload": ...}`. Outbound events are serialized by a
//! dedicated writer task so a slow client never blocks the run, and runs
//! are handled off the read loop so inbound frames keep being read.

use crate::context::AppContext;
use crate::rate_limit::caller_identity;
use crate::session::{Connection, Session};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use rk_protocol::ServerEvent;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const OUTBOUND_BUFFER: usize = 256;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(ctx): State<Arc<AppContext>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok());
    let identity = caller_identity(forwarded, Some(peer));
    ws.on_upgrade(move |socket| handle_socket(socket, ctx, identity))
}

async fn handle_socket(socket: WebSocket, ctx: Arc<AppContext>, identity: String) {
    info!(identity = %identity, "Client connected");
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER);

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, kind = event.kind(), "Failed to serialize event");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut connection = Connection::new(Session::new(ctx, identity.clone(), tx));
    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => connection.on_frame(&text).await,
            Message::Close(_) => break,
            other => debug!(?other, "Ignoring non-text frame"),
        }
    }

    if connection.is_busy() {
        info!(identity = %identity, "Client left mid-run; letting the run finish");
    }
    connection.finish().await;
    let _ = send_task.await;
    info!(identity = %identity, "Client disconnected");
}
