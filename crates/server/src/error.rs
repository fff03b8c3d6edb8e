//! Gateway-level errors surfaced to the observer as `agent:error`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The start request lacks a query or a thread id.
    #[error("Missing query or threadId")]
    Validation,

    /// The frame could not be decoded at all.
    #[error("{0}")]
    Malformed(String),

    #[error("Live demo quota exceeded (maximum {0} requests per user). Please view the simulated demo or provide your own API key.")]
    QuotaExceeded(u32),

    #[error("Rewind feature is under construction.")]
    RewindUnavailable,
}
