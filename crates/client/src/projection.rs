//! Fold of wire events into renderable run state.

use rk_protocol::{
    idle_records, Checkpoint, ServerEvent, StageName, StageRecords, StageStatus,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub query: Option<String>,
    pub thread_id: Option<String>,
    /// Live per-stage records.
    pub records: StageRecords,
    /// Stage of the most recent `agent:node_start`.
    pub active: Option<StageName>,
    /// Writer output of the active stage; cleared on every stage start.
    pub token_buffer: String,
    /// Legacy `agent:thought` transcript. Kept apart from structured logs.
    pub thoughts: String,
    pub checkpoints: Vec<Checkpoint>,
    /// Index into `checkpoints` being viewed instead of the live tail.
    pub rewind: Option<usize>,
    pub streaming: bool,
    pub error: Option<String>,
    pub final_report: Option<String>,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            query: None,
            thread_id: None,
            records: idle_records(),
            active: None,
            token_buffer: String::new(),
            thoughts: String::new(),
            checkpoints: Vec::new(),
            rewind: None,
            streaming: false,
            error: None,
            final_report: None,
        }
    }
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new run that is about to be requested.
    pub fn begin(&mut self, query: impl Into<String>, thread_id: impl Into<String>) {
        *self = Self {
            query: Some(query.into()),
            thread_id: Some(thread_id.into()),
            streaming: true,
            ..Self::default()
        };
    }

    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::NodeStart { node } => {
                self.active = Some(*node);
                self.token_buffer.clear();
                self.set_status(*node, StageStatus::Running);
            }
            ServerEvent::Log { node, text } => {
                if let Some(record) = self.records.get_mut(node) {
                    record.logs.push(text.clone());
                }
            }
            ServerEvent::ToolCall(call) => match self.active {
                Some(node) => {
                    if let Some(record) = self.records.get_mut(&node) {
                        record.tool_calls.push(call.clone());
                    }
                }
                None => debug!(tool = %call.tool, "Tool call outside any stage"),
            },
            ServerEvent::NodeComplete { node } => self.set_status(*node, StageStatus::Complete),
            ServerEvent::Checkpoint(checkpoint) => self.checkpoints.push(checkpoint.clone()),
            ServerEvent::Report { text } => {
                self.final_report = Some(text.clone());
                if let Some(writer) = self.records.get_mut(&StageName::Writer) {
                    writer.result = Some(text.clone());
                }
            }
            ServerEvent::Complete { text } => {
                self.streaming = false;
                if self.final_report.is_none() && !text.is_empty() {
                    self.final_report = Some(text.clone());
                }
            }
            ServerEvent::Error { message } => {
                self.streaming = false;
                self.error = Some(message.clone());
                if let Some(node) = self.active {
                    if self.records.get(&node).map(|r| r.status) == Some(StageStatus::Running) {
                        self.set_status(node, StageStatus::Failed);
                    }
                }
            }
            ServerEvent::Thought { text } => self.thoughts.push_str(text),
            ServerEvent::Token { text } => self.token_buffer.push_str(text),
        }
    }

    /// View checkpoint `index` instead of the live state, or return to live
    /// with `None`. Out-of-range indices clamp to the newest checkpoint; with
    /// no checkpoints the view stays live.
    pub fn set_rewind(&mut self, index: Option<usize>) {
        self.rewind = match (index, self.checkpoints.len()) {
            (_, 0) | (None, _) => None,
            (Some(i), len) => Some(i.min(len - 1)),
        };
    }

    /// The records to render: the rewound checkpoint's snapshot, or live.
    pub fn visible_states(&self) -> &StageRecords {
        self.rewind
            .and_then(|i| self.checkpoints.get(i))
            .map(|cp| &cp.agent_states)
            .unwrap_or(&self.records)
    }

    /// Whether a terminal event has been seen.
    pub fn is_finished(&self) -> bool {
        !self.streaming && (self.error.is_some() || self.final_report.is_some())
    }

    fn set_status(&mut self, node: StageName, status: StageStatus) {
        if let Some(record) = self.records.get_mut(&node) {
            record.status = status;
        }
    }
}
