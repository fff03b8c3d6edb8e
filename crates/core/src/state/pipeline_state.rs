//! Cumulative pipeline state.
//!
//! Each stage returns a [`PartialState`] that is folded into the running
//! [`PipelineState`] with per-field reducers:
//! - `messages` concatenates in arrival order
//! - every other field is last-write-wins; a present value replaces the
//!   previous one, an absent value leaves it untouched

use serde::{Deserialize, Serialize};

/// Author of a message in the exchange log.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Human,
    System,
    Ai,
}

/// One entry of the exchange log (search results, model outputs).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Human,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Ai,
            content: content.into(),
        }
    }
}

/// State accumulated across the three stages of one run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    /// The research query. Fixed once the run starts.
    pub query: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub research_data: String,
    #[serde(default)]
    pub analysis_data: String,
    #[serde(default)]
    pub final_report: String,
}

impl PipelineState {
    /// A fresh state for `query` with every other field defaulted.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// The initial input of a run: the query plus the user's message.
    pub fn for_query(query: impl Into<String>) -> Self {
        let query = query.into();
        let message = Message::human(query.clone());
        Self::new(query).with_message(message)
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Fold a stage's partial update into this state.
    pub fn apply(&mut self, update: PartialState) {
        self.messages.extend(update.messages);
        if let Some(research_data) = update.research_data {
            self.research_data = research_data;
        }
        if let Some(analysis_data) = update.analysis_data {
            self.analysis_data = analysis_data;
        }
        if let Some(final_report) = update.final_report {
            self.final_report = final_report;
        }
    }
}

/// The fields a single stage produced.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PartialState {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_report: Option<String>,
}

impl PartialState {
    pub fn research(data: impl Into<String>, message: Message) -> Self {
        Self {
            research_data: Some(data.into()),
            messages: vec![message],
            ..Self::default()
        }
    }

    pub fn analysis(data: impl Into<String>) -> Self {
        let data = data.into();
        Self {
            messages: vec![Message::ai(data.clone())],
            analysis_data: Some(data),
            ..Self::default()
        }
    }

    pub fn report(data: impl Into<String>) -> Self {
        let data = data.into();
        Self {
            messages: vec![Message::ai(data.clone())],
            final_report: Some(data),
            ..Self::default()
        }
    }
}
