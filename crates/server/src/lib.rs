//! # rk-server
//!
//! Session gateway for research-kit.
//!
//! Every connection gets a [`session::Session`] that applies the per-caller
//! quota, validates and moderates the request, drives the pipeline engine
//! and relays its progress as wire events.
//!
//! ## Modules
//!
//! - [`context`]: Process-wide state with an explicit lifecycle
//! - [`rate_limit`]: Fixed-window quota and caller identity
//! - [`session`]: Request handling for one connection
//! - [`translate`]: Engine events to wire events
//! - [`routes`], [`ws`]: axum transport

pub mod context;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod session;
pub mod translate;
pub mod ws;

pub use context::AppContext;
pub use error::GatewayError;
pub use routes::{router, serve};
pub use session::{Connection, Session};
