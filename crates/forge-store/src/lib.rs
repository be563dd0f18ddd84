//! # forge-store
//!
//! Storage backends for funnelforge.
//!
//! The job token protocol tracks every long-running job through a single
//! key in a shared, process-external store (see `forge_core::StateStore`):
//!
//! - [`MemoryStateStore`]: in-process map with lazy TTL expiry, for tests
//!   and single-instance deployments.
//! - [`RedisStateStore`]: Redis-backed store so any process instance can
//!   serve the poll for a token issued elsewhere.
//!
//! Alongside the state store live the in-memory repository and file-store
//! implementations backing single-instance deployments and tests; the
//! production equivalents (database, object storage) sit behind the same
//! `forge_core` traits.

pub mod files;
pub mod listings;
pub mod memory;
pub mod pages;
pub mod redis_store;

pub use files::MemoryFileStore;
pub use listings::MemoryListingRepository;
pub use memory::MemoryStateStore;
pub use pages::MemoryPageRepository;
pub use redis_store::RedisStateStore;
