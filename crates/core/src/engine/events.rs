//! Events produced by the pipeline engine for one run.

use crate::state::PartialState;
use rk_protocol::StageName;

/// Engine output, delivered in emission order over a channel.
///
/// Per stage: `StageStart`, any number of `ContentChunk`, then `StageEnd`.
/// A run ends with exactly one `Complete` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    StageStart(StageName),
    ContentChunk { stage: StageName, text: String },
    /// Carries the stage's full partial update. Sent after the checkpoint
    /// for the stage has been written.
    StageEnd { stage: StageName, update: PartialState },
    Error(String),
    Complete,
}

impl EngineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineEvent::Complete | EngineEvent::Error(_))
    }
}
