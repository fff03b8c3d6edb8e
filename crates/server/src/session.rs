//! Per-connection request handling.
//!
//! A [`Session`] turns inbound [`ClientOp`]s into outbound [`ServerEvent`]s.
//! It is transport-agnostic: the WebSocket handler and the CLI both feed it
//! and drain its channel. [`Connection`] wraps a session for a frame-reading
//! transport so that runs never block the read loop.

use crate::context::AppContext;
use crate::error::GatewayError;
use crate::translate::{refusal_events, RunTranslator, MISSING_REPORT};
use rk_core::engine::EngineEvent;
use rk_core::state::PipelineState;
use rk_protocol::{ClientOp, ProtocolError, RewindPayload, ServerEvent, StartPayload};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{info, warn};

/// Sent when the run ends without a terminal event or with an empty message.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

#[derive(Clone)]
pub struct Session {
    ctx: Arc<AppContext>,
    identity: String,
    out: Sender<ServerEvent>,
}

/// A start request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub query: String,
    pub thread_id: String,
}

impl StartRequest {
    /// Both fields must be present and non-blank.
    pub fn from_payload(payload: StartPayload) -> Result<Self, GatewayError> {
        let (query, thread_id) = payload.into_parts();
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (present(query), present(thread_id)) {
            (Some(query), Some(thread_id)) => Ok(Self { query, thread_id }),
            _ => Err(GatewayError::Validation),
        }
    }
}

impl Session {
    /// # Arguments
    ///
    /// * `ctx` - Shared gateway context
    /// * `identity` - Rate-limit key of the caller
    /// * `out` - Channel receiving every event for this connection
    pub fn new(ctx: Arc<AppContext>, identity: impl Into<String>, out: Sender<ServerEvent>) -> Self {
        Self {
            ctx,
            identity: identity.into(),
            out,
        }
    }

    /// Decode and handle one text frame.
    pub async fn handle_frame(&self, text: &str) {
        match decode(text) {
            Ok(op) => self.handle(op).await,
            Err(e) => self.reject(e).await,
        }
    }

    pub async fn handle(&self, op: ClientOp) {
        match op {
            ClientOp::Start(payload) => self.start(payload).await,
            ClientOp::Rewind(payload) => self.rewind(payload).await,
        }
    }

    async fn start(&self, payload: StartPayload) {
        let max = self.ctx.config.rate_limit.max_requests;
        if !self.ctx.limiter.try_acquire(&self.identity) {
            warn!(identity = %self.identity, "Request quota exceeded");
            self.fail(GatewayError::QuotaExceeded(max)).await;
            return;
        }

        let request = match StartRequest::from_payload(payload) {
            Ok(request) => request,
            Err(e) => {
                self.fail(e).await;
                return;
            }
        };
        info!(
            identity = %self.identity,
            thread_id = %request.thread_id,
            query = %request.query,
            "Start research"
        );

        let verdict = self.ctx.moderation.evaluate(&request.query).await;
        if !verdict.allowed {
            info!(thread_id = %request.thread_id, reason = ?verdict.reason, "Query rejected by moderation");
            for event in refusal_events(verdict.reason.as_deref()) {
                self.emit(event).await;
            }
            return;
        }

        self.run(request).await;
    }

    async fn run(&self, request: StartRequest) {
        let StartRequest { query, thread_id } = request;
        let mut translator = RunTranslator::new(query.clone());
        let mut events = Arc::clone(&self.ctx.engine)
            .run_stream(PipelineState::for_query(query), thread_id.clone());

        while let Some(event) = events.next().await {
            match event {
                EngineEvent::Complete => {
                    let report = match self.ctx.engine.get_state(&thread_id).await {
                        Ok(Some(state)) => state.final_report,
                        Ok(None) => MISSING_REPORT.to_string(),
                        Err(e) => {
                            self.emit(ServerEvent::error(non_empty(e.to_string()))).await;
                            return;
                        }
                    };
                    for event in translator.finish(report) {
                        self.emit(event).await;
                    }
                    return;
                }
                EngineEvent::Error(message) => {
                    for event in translator.translate(EngineEvent::Error(non_empty(message))) {
                        self.emit(event).await;
                    }
                    return;
                }
                other => {
                    for event in translator.translate(other) {
                        self.emit(event).await;
                    }
                }
            }
        }

        warn!(thread_id = %thread_id, "Engine stream closed without a terminal event");
        self.emit(ServerEvent::error(UNKNOWN_ERROR)).await;
    }

    async fn rewind(&self, payload: RewindPayload) {
        info!(
            identity = %self.identity,
            checkpoint_id = ?payload.checkpoint_id,
            "Rewind requested"
        );
        self.fail(GatewayError::RewindUnavailable).await;
    }

    async fn reject(&self, error: ProtocolError) {
        warn!(identity = %self.identity, error = %error, "Rejected frame");
        self.fail(GatewayError::Malformed(error.to_string())).await;
    }

    async fn fail(&self, error: GatewayError) {
        self.emit(ServerEvent::error(error.to_string())).await;
    }

    async fn emit(&self, event: ServerEvent) {
        let _ = self.out.send(event).await;
    }
}

/// A frame-reading front for a [`Session`].
///
/// Starts run on a background task, so rewinds and unknown frames are
/// answered while a run is in progress. At most one start is in flight per
/// connection; a later start waits for the earlier one to finish.
pub struct Connection {
    session: Session,
    in_flight: Option<JoinHandle<()>>,
}

impl Connection {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            in_flight: None,
        }
    }

    /// Handle one text frame without waiting for a run to finish.
    pub async fn on_frame(&mut self, text: &str) {
        match decode(text) {
            Ok(ClientOp::Start(payload)) => self.spawn_start(payload),
            Ok(op) => self.session.handle(op).await,
            Err(e) => self.session.reject(e).await,
        }
    }

    /// Whether a start is still being handled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait for the in-flight run, if any, then release the session.
    pub async fn finish(mut self) {
        if let Some(handle) = self.in_flight.take() {
            let _ = handle.await;
        }
    }

    fn spawn_start(&mut self, payload: StartPayload) {
        let previous = self.in_flight.take();
        let session = self.session.clone();
        self.in_flight = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            session.handle(ClientOp::Start(payload)).await;
        }));
    }
}

/// Parse a frame. An undecodable start still counts against the quota and
/// then fails validation, so it is turned into an empty start.
fn decode(text: &str) -> Result<ClientOp, ProtocolError> {
    match ClientOp::parse(text) {
        Err(ProtocolError::BadPayload { kind, .. }) if kind == "research:start" => {
            Ok(ClientOp::Start(StartPayload::Structured {
                query: None,
                thread_id: None,
            }))
        }
        other => other,
    }
}

fn non_empty(message: String) -> String {
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}
