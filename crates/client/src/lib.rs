//! # rk-client
//!
//! Observer-side state for research-kit.
//!
//! [`Projection`] rebuilds pipeline progress from nothing but the relayed
//! [`rk_protocol::ServerEvent`] stream. It never talks back to the engine;
//! an observer only issues `research:start` and `research:rewind` requests.

pub mod projection;

pub use projection::Projection;
