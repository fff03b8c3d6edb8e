//! Engine events to wire events.
//!
//! A [`RunTranslator`] belongs to exactly one run. It keeps that run's
//! per-stage records so every `agent:checkpoint` carries cumulative status,
//! and it synthesizes the descriptive log lines and tool-call records the
//! observer renders.

use chrono::Utc;
use rk_core::engine::EngineEvent;
use rk_core::stages::prompts::count_sources;
use rk_core::state::PartialState;
use rk_protocol::{
    idle_records, Checkpoint, ServerEvent, StageName, StageRecords, StageStatus, ToolCallRecord,
};

/// Report text used when a finished run has no report.
pub const MISSING_REPORT: &str = "Research finished but no final report was generated.";

/// Refusal text used when moderation gives no reason.
pub const DEFAULT_REFUSAL: &str = "I'm sorry, I cannot process this request. It falls outside my designated safety guidelines or professional scope.";

pub struct RunTranslator {
    query: String,
    records: StageRecords,
    active: Option<StageName>,
}

impl RunTranslator {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            records: idle_records(),
            active: None,
        }
    }

    pub fn records(&self) -> &StageRecords {
        &self.records
    }

    /// Wire events for one engine event.
    ///
    /// `Complete` yields nothing here: the closing events need the persisted
    /// report and are built by [`finish`](Self::finish).
    pub fn translate(&mut self, event: EngineEvent) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        match event {
            EngineEvent::StageStart(node) => {
                self.active = Some(node);
                self.set_status(node, StageStatus::Running);
                out.push(ServerEvent::NodeStart { node });
                for line in intro_lines(node) {
                    self.log(node, line, &mut out);
                }
            }
            EngineEvent::ContentChunk { stage, text } => {
                if text.is_empty() {
                    return out;
                }
                match stage {
                    StageName::Writer => out.push(ServerEvent::Token { text }),
                    StageName::Analyst | StageName::Researcher => {
                        out.push(ServerEvent::Thought { text })
                    }
                }
            }
            EngineEvent::StageEnd { stage, update } => {
                self.set_status(stage, StageStatus::Complete);
                self.close_stage(stage, &update, &mut out);
                out.push(ServerEvent::NodeComplete { node: stage });
                out.push(ServerEvent::Checkpoint(self.checkpoint(stage)));
                self.active = None;
            }
            EngineEvent::Error(message) => {
                if let Some(node) = self.active.take() {
                    self.set_status(node, StageStatus::Failed);
                }
                out.push(ServerEvent::error(message));
            }
            EngineEvent::Complete => {}
        }
        out
    }

    /// Closing events of a successful run.
    pub fn finish(&mut self, report: String) -> Vec<ServerEvent> {
        let report = if report.trim().is_empty() {
            MISSING_REPORT.to_string()
        } else {
            report
        };
        if let Some(writer) = self.records.get_mut(&StageName::Writer) {
            writer.result = Some(report.clone());
        }
        vec![
            ServerEvent::Report {
                text: report.clone(),
            },
            ServerEvent::Complete { text: report },
        ]
    }

    fn close_stage(&mut self, stage: StageName, update: &PartialState, out: &mut Vec<ServerEvent>) {
        match stage {
            StageName::Researcher => {
                let sources = count_sources(update.research_data.as_deref().unwrap_or(""));
                let search = ToolCallRecord::new(
                    "Tavily Search",
                    self.query.clone(),
                    format!("Found {sources} results: web pages and articles"),
                );
                self.tool_call(stage, search, out);
                if sources > 0 {
                    let scrape = ToolCallRecord::new(
                        "Web Scraper",
                        "Search Results URLs",
                        format!("Extracted relevant text chunks from {sources} sources"),
                    );
                    self.tool_call(stage, scrape, out);
                }
                self.log(
                    stage,
                    &format!("✅ Research phase complete — {sources} sources gathered."),
                    out,
                );
            }
            StageName::Analyst => {
                let chars = update
                    .analysis_data
                    .as_deref()
                    .map(|a| a.chars().count())
                    .unwrap_or(0);
                let clustering = ToolCallRecord::new(
                    "Semantic Clustering",
                    format!("{chars} characters of context, threshold: 0.82"),
                    "Clusters identified: Architecture, Communication, Evaluation, Applications",
                );
                self.tool_call(stage, clustering, out);
                self.log(stage, "✅ Analysis phase complete.", out);
            }
            StageName::Writer => {
                let citations = ToolCallRecord::new(
                    "Citation Formatter",
                    "Analyzed sources, format: numbered",
                    "Generated formal citations and formatting",
                );
                self.tool_call(stage, citations, out);
                self.log(stage, "✅ Report generation complete.", out);
                if let Some(record) = self.records.get_mut(&stage) {
                    record.result = update.final_report.clone().filter(|r| !r.is_empty());
                }
            }
        }
    }

    fn set_status(&mut self, node: StageName, status: StageStatus) {
        if let Some(record) = self.records.get_mut(&node) {
            record.status = status;
        }
    }

    /// Structured log line plus its mirror on the thought channel.
    fn log(&mut self, node: StageName, line: &str, out: &mut Vec<ServerEvent>) {
        if let Some(record) = self.records.get_mut(&node) {
            record.logs.push(line.to_string());
        }
        out.push(ServerEvent::Log {
            node,
            text: line.to_string(),
        });
        out.push(ServerEvent::Thought {
            text: format!("{line}\n"),
        });
    }

    fn tool_call(&mut self, node: StageName, call: ToolCallRecord, out: &mut Vec<ServerEvent>) {
        let mirror = format!("🔧 [{}] {} → {}\n", call.tool, call.input, call.output);
        if let Some(record) = self.records.get_mut(&node) {
            record.tool_calls.push(call.clone());
        }
        out.push(ServerEvent::ToolCall(call));
        out.push(ServerEvent::Thought { text: mirror });
    }

    fn checkpoint(&self, node: StageName) -> Checkpoint {
        let now = Utc::now().timestamp_millis();
        Checkpoint {
            id: format!("cp-{now}-{node}"),
            timestamp: now,
            active_node: node,
            agent_states: self.records.clone(),
        }
    }
}

fn intro_lines(node: StageName) -> [&'static str; 2] {
    match node {
        StageName::Researcher => [
            "🔍 Initiating web search for query...",
            "📡 Connecting to Tavily search API...",
        ],
        StageName::Analyst => [
            "🧠 Analyzing extracted content for key themes...",
            "📊 Identifying patterns across sources...",
        ],
        StageName::Writer => [
            "✍️ Generating report outline...",
            "📝 Writing findings section with citations...",
        ],
    }
}

/// The canned writer-stage sequence sent instead of a run when moderation
/// rejects the query. The refusal goes through the normal completion
/// channel, not the error channel.
pub fn refusal_events(reason: Option<&str>) -> Vec<ServerEvent> {
    let refusal = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REFUSAL)
        .to_string();
    let node = StageName::Writer;
    vec![
        ServerEvent::NodeStart { node },
        ServerEvent::Log {
            node,
            text: "🛡️ Analyzing request compliance...".to_string(),
        },
        ServerEvent::Thought {
            text: "🛡️ Request violates moderation policy. Generating refusal response.\n"
                .to_string(),
        },
        ServerEvent::Log {
            node,
            text: "🚫 Request rejected by moderation layer.".to_string(),
        },
        ServerEvent::NodeComplete { node },
        ServerEvent::Token {
            text: refusal.clone(),
        },
        ServerEvent::Report {
            text: refusal.clone(),
        },
        ServerEvent::Complete { text: refusal },
    ]
}
