//! Stage observation models.
//!
//! These are the records an observer sees for each pipeline stage: its
//! lifecycle status, the log lines and tool-call audit entries emitted while
//! it ran, and the checkpoint snapshots taken after each stage completes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// One of the three fixed pipeline stages.
///
/// The declaration order is the execution order, so `Ord` on this type
/// is the pipeline order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Researcher,
    Analyst,
    Writer,
}

impl StageName {
    /// All stages in execution order.
    pub const ALL: [StageName; 3] = [StageName::Researcher, StageName::Analyst, StageName::Writer];

    pub fn as_str(self) -> &'static str {
        match self {
            StageName::Researcher => "researcher",
            StageName::Analyst => "analyst",
            StageName::Writer => "writer",
        }
    }

    /// Zero-based position in the pipeline.
    pub fn index(self) -> usize {
        match self {
            StageName::Researcher => 0,
            StageName::Analyst => 1,
            StageName::Writer => 2,
        }
    }

    /// The stage that runs after this one, if any.
    pub fn next(self) -> Option<StageName> {
        StageName::ALL.get(self.index() + 1).copied()
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "researcher" => Ok(StageName::Researcher),
            "analyst" => Ok(StageName::Analyst),
            "writer" => Ok(StageName::Writer),
            other => Err(format!("unknown stage: {other}")),
        }
    }
}

/// Lifecycle status of a stage as seen by an observer.
///
/// Progresses `Idle -> Running -> Complete`, or `Running -> Failed` when
/// the stage raised an unrecovered error.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    #[default]
    Idle,
    Running,
    Complete,
    Failed,
}

/// Audit entry synthesized by the gateway from a stage outcome.
///
/// This is a presentation record, not authoritative tool telemetry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ToolCallRecord {
    pub tool: String,
    pub input: String,
    pub output: String,
}

impl ToolCallRecord {
    pub fn new(tool: impl Into<String>, input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Per-stage observation state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    pub node: StageName,
    pub status: StageStatus,
    pub logs: Vec<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub result: Option<String>,
}

impl StageRecord {
    /// A fresh record in `Idle` status with no logs.
    pub fn idle(node: StageName) -> Self {
        Self {
            node,
            status: StageStatus::Idle,
            logs: Vec::new(),
            tool_calls: Vec::new(),
            result: None,
        }
    }
}

/// Records for all three stages, keyed (and ordered) by stage.
pub type StageRecords = BTreeMap<StageName, StageRecord>;

/// Build the idle record set used at the start of every run.
pub fn idle_records() -> StageRecords {
    StageName::ALL
        .iter()
        .map(|&stage| (stage, StageRecord::idle(stage)))
        .collect()
}

/// Snapshot of per-stage status taken after a stage completes.
///
/// `agent_states` is cumulative: stages completed in earlier checkpoints
/// stay `Complete` in every later one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    #[ts(type = "number")]
    pub timestamp: i64,
    pub active_node: StageName,
    pub agent_states: StageRecords,
}
