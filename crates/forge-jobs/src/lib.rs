//! # forge-jobs
//!
//! Async job orchestration for funnelforge.
//!
//! This crate provides:
//! - The job token protocol: opaque `pending-request:` tokens, a record
//!   seeded synchronously before the HTTP response, and the
//!   `processing → completed | error` terminal-state contract
//! - Fire-and-forget dispatch of detached background workers
//! - A bounded retry combinator for externally-collaborating calls
//! - The four concrete workers: page cloning, page crawling/generation,
//!   chat completion, and listing matching
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use forge_jobs::{JobDispatcher, JobTracker, PollOutcome, ChatCompletionHandler};
//! use forge_store::RedisStateStore;
//!
//! let store = Arc::new(RedisStateStore::from_env().await?);
//! let dispatcher = JobDispatcher::new(JobTracker::new(store));
//!
//! // Request handler: seed the record, spawn the worker, return the token.
//! let token = dispatcher.submit(handler, input).await?;
//!
//! // Polling handler: map the outcome onto 404 / 202 / 200 / 500.
//! match dispatcher.tracker().poll(&token).await? {
//!     PollOutcome::Processing { .. } => { /* 202 */ }
//!     PollOutcome::Completed { response } => { /* 200 */ }
//!     PollOutcome::Error { message } => { /* 500 */ }
//!     PollOutcome::NotFound => { /* 404 */ }
//! }
//! ```

pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod mock;
pub mod retry;
pub mod token;

// Re-export core types
pub use forge_core::*;

pub use dispatcher::JobDispatcher;
pub use handler::{JobContext, JobHandler, JobResult, NoOpHandler};
pub use handlers::{ChatCompletionHandler, ListingMatchHandler, PageCloneHandler, PageCrawlHandler};
pub use retry::with_retries;
pub use token::{new_token, JobTracker, PollOutcome};

/// Default maximum attempts for collaborator calls inside workers.
pub const DEFAULT_MAX_ATTEMPTS: u32 = forge_core::defaults::JOB_MAX_ATTEMPTS;
