//! # rk-protocol
//!
//! Wire protocol shared between the research gateway and its observers.
//!
//! This crate defines:
//! - Per-stage observation records and checkpoints
//! - Client requests (`research:start`, `research:rewind`)
//! - Server events (`agent:*`) relayed to the observer
//!
//! ## Modules
//!
//! - [`stage_models`]: Stage names, statuses, tool-call audit entries, checkpoints
//! - [`ipc`]: Client operations and server events
//!
//! ## Design Principles
//!
//! - Minimal dependencies: only serde and ts-rs
//! - TypeScript generation: all types derive `TS` so browser observers share the shapes
//! - Independent compilation: no dependencies on other research-kit crates

pub mod ipc;
pub mod stage_models;

// Re-export all public types for convenience
pub use ipc::*;
pub use stage_models::*;
