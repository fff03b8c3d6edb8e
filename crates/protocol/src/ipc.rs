//! Gateway communication protocol.
//!
//! This module defines the message types exchanged between an observer
//! (browser, CLI) and the research gateway over a persistent channel.
//!
//! The protocol follows an Op/Event pattern:
//! - `ClientOp`: Requests sent from the observer to the gateway
//! - `ServerEvent`: Progress updates relayed from the gateway to the observer
//!
//! Every frame is one JSON object with a `type` tag and a `payload`:
//! ```json
//! {
//!   "type": "agent:log",
//!   "payload": { "node": "researcher", "text": "🔍 Initiating web search for query..." }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::stage_models::{Checkpoint, StageName, ToolCallRecord};

/// Payload of a `research:start` request.
///
/// Older observers send the query as a bare string or as a
/// `[query, threadId]` pair; newer ones send an object. All shapes are
/// accepted here and normalised with [`StartPayload::into_parts`] before
/// any business logic sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
pub enum StartPayload {
    Bare(String),
    Positional(Vec<String>),
    Structured {
        #[serde(default)]
        query: Option<String>,
        #[serde(default, rename = "threadId")]
        thread_id: Option<String>,
    },
}

impl StartPayload {
    /// Build the structured form.
    pub fn new(query: impl Into<String>, thread_id: impl Into<String>) -> Self {
        StartPayload::Structured {
            query: Some(query.into()),
            thread_id: Some(thread_id.into()),
        }
    }

    /// Split into `(query, thread_id)`, either of which may be absent.
    pub fn into_parts(self) -> (Option<String>, Option<String>) {
        match self {
            StartPayload::Bare(query) => (Some(query), None),
            StartPayload::Positional(parts) => {
                let mut parts = parts.into_iter();
                (parts.next(), parts.next())
            }
            StartPayload::Structured { query, thread_id } => (query, thread_id),
        }
    }
}

/// Payload of a `research:rewind` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RewindPayload {
    #[serde(default)]
    #[ts(optional)]
    pub checkpoint_id: Option<String>,
}

/// Requests sent from the observer to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload")]
pub enum ClientOp {
    /// Start a research run for a query under a caller-chosen thread id.
    #[serde(rename = "research:start")]
    Start(StartPayload),

    /// Rewind to an earlier checkpoint.
    #[serde(rename = "research:rewind")]
    Rewind(RewindPayload),
}

/// Errors raised while decoding an inbound frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(String),
    #[error("Unknown request type: {0}")]
    UnknownType(String),
    #[error("Malformed payload for {kind}: {reason}")]
    BadPayload { kind: String, reason: String },
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl ClientOp {
    /// Decode a text frame.
    ///
    /// Rewind requests are accepted with any payload (a bare id string, an
    /// object, or nothing at all) since the gateway answers all of them the
    /// same way.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let frame: RawFrame =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        match frame.kind.as_str() {
            "research:start" => serde_json::from_value::<StartPayload>(frame.payload)
                .map(ClientOp::Start)
                .map_err(|e| ProtocolError::BadPayload {
                    kind: frame.kind.clone(),
                    reason: e.to_string(),
                }),
            "research:rewind" => {
                let checkpoint_id = match frame.payload {
                    serde_json::Value::String(id) => Some(id),
                    serde_json::Value::Object(map) => map
                        .get("checkpointId")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    _ => None,
                };
                Ok(ClientOp::Rewind(RewindPayload { checkpoint_id }))
            }
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

/// Events relayed from the gateway to the observer.
///
/// For one run these arrive in causal order: per stage `agent:node_start`,
/// `agent:log`*, `agent:tool_call`*, `agent:node_complete`,
/// `agent:checkpoint`; then `agent:report` and `agent:complete`. An
/// `agent:error` may arrive at any point and ends the run.
///
/// `agent:thought` and `agent:token` form the legacy text channel: thought
/// mirrors every log line and tool call plus raw analyst reasoning, token
/// carries writer output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload")]
pub enum ServerEvent {
    #[serde(rename = "agent:node_start")]
    NodeStart { node: StageName },

    #[serde(rename = "agent:log")]
    Log { node: StageName, text: String },

    #[serde(rename = "agent:tool_call")]
    ToolCall(ToolCallRecord),

    #[serde(rename = "agent:node_complete")]
    NodeComplete { node: StageName },

    #[serde(rename = "agent:checkpoint")]
    Checkpoint(Checkpoint),

    /// The final markdown report.
    #[serde(rename = "agent:report")]
    Report { text: String },

    /// Terminal success marker; carries the report for older observers.
    #[serde(rename = "agent:complete")]
    Complete { text: String },

    /// Terminal failure marker.
    #[serde(rename = "agent:error")]
    Error { message: String },

    #[serde(rename = "agent:thought")]
    Thought { text: String },

    #[serde(rename = "agent:token")]
    Token { text: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    /// Whether this event ends the stream for a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerEvent::Complete { .. } | ServerEvent::Error { .. })
    }

    /// The wire name of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::NodeStart { .. } => "agent:node_start",
            ServerEvent::Log { .. } => "agent:log",
            ServerEvent::ToolCall(_) => "agent:tool_call",
            ServerEvent::NodeComplete { .. } => "agent:node_complete",
            ServerEvent::Checkpoint(_) => "agent:checkpoint",
            ServerEvent::Report { .. } => "agent:report",
            ServerEvent::Complete { .. } => "agent:complete",
            ServerEvent::Error { .. } => "agent:error",
            ServerEvent::Thought { .. } => "agent:thought",
            ServerEvent::Token { .. } => "agent:token",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_payload_shapes_normalise() {
        let structured: StartPayload =
            serde_json::from_str(r#"{"query":"climate policy","threadId":"t1"}"#).unwrap();
        assert_eq!(
            structured.into_parts(),
            (Some("climate policy".to_string()), Some("t1".to_string()))
        );

        let positional: StartPayload = serde_json::from_str(r#"["climate policy","t1"]"#).unwrap();
        assert_eq!(
            positional.into_parts(),
            (Some("climate policy".to_string()), Some("t1".to_string()))
        );

        let bare: StartPayload = serde_json::from_str(r#""climate policy""#).unwrap();
        assert_eq!(bare.into_parts(), (Some("climate policy".to_string()), None));
    }

    #[test]
    fn test_parse_rewind_accepts_any_payload() {
        let op = ClientOp::parse(r#"{"type":"research:rewind","payload":"cp-1"}"#).unwrap();
        assert_eq!(
            op,
            ClientOp::Rewind(RewindPayload {
                checkpoint_id: Some("cp-1".to_string())
            })
        );

        let op = ClientOp::parse(r#"{"type":"research:rewind"}"#).unwrap();
        assert_eq!(op, ClientOp::Rewind(RewindPayload::default()));

        let op = ClientOp::parse(r#"{"type":"research:rewind","payload":42}"#).unwrap();
        assert_eq!(op, ClientOp::Rewind(RewindPayload::default()));
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        assert!(matches!(
            ClientOp::parse(r#"{"type":"research:pause"}"#),
            Err(ProtocolError::UnknownType(_))
        ));
        assert!(matches!(
            ClientOp::parse("not json"),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientOp::parse(r#"{"type":"research:start","payload":42}"#),
            Err(ProtocolError::BadPayload { .. })
        ));
    }

    #[test]
    fn test_terminal_events() {
        assert!(ServerEvent::error("boom").is_terminal());
        assert!(ServerEvent::Complete {
            text: String::new()
        }
        .is_terminal());
        assert!(!ServerEvent::Token {
            text: "x".to_string()
        }
        .is_terminal());
    }
}
