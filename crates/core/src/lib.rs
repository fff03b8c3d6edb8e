//! # rk-core
//!
//! Streaming orchestration core for research-kit.
//!
//! This crate provides:
//! - The cumulative pipeline state and its per-field reducers
//! - Capability traits for the language model and web search, with Gemini,
//!   Tavily and mock adapters
//! - The moderation gate
//! - The three stage functions and the engine that sequences them
//! - Durable checkpoint storage
//! - Configuration loading
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and management
//! - [`engine`]: Pipeline execution engine and its event type
//! - [`moderation`]: Query classifier run before any pipeline work
//! - [`services`]: Upstream service capabilities and adapters
//! - [`stages`]: Researcher, Analyst and Writer
//! - [`state`]: Pipeline state and reducers
//! - [`store`]: Checkpoint persistence

pub mod config;
pub mod engine;
pub mod moderation;
pub mod services;
pub mod stages;
pub mod state;
pub mod store;
