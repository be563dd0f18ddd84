//! # forge-core
//!
//! Core types, traits, and abstractions for the funnelforge backend.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other funnelforge crates depend on: the job-record
//! model for the async token protocol, relevance-ranking types, the
//! collaborator traits workers call through, shared error handling,
//! centralized defaults, and structured-logging field constants.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
