//! Common test utilities shared by the integration tests.
//!
//! - Fixtures (engines wired to scripted services, event drains)
//! - Custom assertions over engine event sequences
//! - Scripted service doubles

pub mod assertions;
pub mod fixtures;
pub mod mock_services;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_services::*;
