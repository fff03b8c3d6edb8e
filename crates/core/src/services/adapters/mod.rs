//! Concrete service clients.

pub mod gemini;
pub mod mock;
pub mod tavily;

pub use gemini::{GeminiConfig, GeminiModel};
pub use mock::{MockModel, MockSearch};
pub use tavily::{TavilyConfig, TavilySearch};
