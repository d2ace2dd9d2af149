//! Shared test utilities for textractor integration tests.
//!
//! - `Harness` wires both handlers to in-memory collaborators
//! - `fakes` holds scriptable analysis, storage and publisher doubles
//! - `messages` builds queue bodies as AWS delivers them

pub mod fakes;
pub mod harness;
pub mod messages;

pub use harness::*;
pub use messages::*;
