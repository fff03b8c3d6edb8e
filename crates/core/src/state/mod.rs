//! Pipeline state and its per-field reducers.
//!
//! This module provides:
//! - `PipelineState`, the cumulative state threaded through every stage
//! - `PartialState`, the subset of fields a single stage produces
//! - `Message`, the append-only exchange log

pub mod pipeline_state;

pub use pipeline_state::{Message, MessageRole, PartialState, PipelineState};
