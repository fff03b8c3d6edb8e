//! Upstream service capabilities.
//!
//! Stages and the moderation gate only ever see the narrow traits defined in
//! [`base`]; concrete clients live under [`adapters`].

pub mod adapters;
pub mod base;

pub use base::{
    LanguageModel, SearchHit, SearchOptions, SearchProvider, ServiceError, ServiceResult,
    TextStream,
};
