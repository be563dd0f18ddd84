//! Core traits for funnelforge abstractions.
//!
//! These traits define the narrow contracts through which the job workers
//! reach their external collaborators (state store, page fetching,
//! screenshot rendering, file storage, AI backends, persistence), enabling
//! pluggable backends and testability.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// STATE STORE
// =============================================================================

/// Shared, process-external key-value store holding serialized JSON state.
///
/// The only shared mutable resource between the HTTP handler and a worker.
/// Must provide at-least last-write-wins semantics per key; no multi-key
/// transactional guarantees are required since each job owns exactly one key.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value under `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Remove the value under `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

// =============================================================================
// PAGE COLLABORATORS
// =============================================================================

/// Fetches raw HTML from an external URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

/// Renders a page screenshot for funnel thumbnails.
#[async_trait]
pub trait ScreenshotRenderer: Send + Sync {
    /// Render `url` and return the image bytes.
    async fn render(&self, url: &str) -> Result<Vec<u8>>;
}

/// Object storage for rendered assets (thumbnails, captured files).
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `bytes` under `key` and return the public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String>;

    /// Best-effort removal of a stored object.
    async fn remove(&self, key: &str) -> Result<()>;
}

// =============================================================================
// AI BACKENDS
// =============================================================================

/// Chat-completion backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model identifier, for diagnostics and response metadata.
    fn model_name(&self) -> &str {
        "unknown"
    }
}

/// Text-embedding backend producing thesis vectors.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn model_name(&self) -> &str {
        "unknown"
    }
}

// =============================================================================
// PERSISTENCE REPOSITORIES
// =============================================================================

/// Repository for funnel/page entities created by the clone/crawl workers.
///
/// Deletion exists for best-effort rollback of partially-created entities
/// when a later worker step fails.
#[async_trait]
pub trait PageRepository: Send + Sync {
    async fn create_funnel(&self, funnel: CreateFunnel) -> Result<String>;

    async fn delete_funnel(&self, funnel_id: &str) -> Result<()>;

    async fn create_page(&self, page: CreatePage) -> Result<String>;

    async fn delete_page(&self, page_id: &str) -> Result<()>;
}

/// Query against the listing repository.
///
/// `filter` is the compiled filter document (see `forge-filter`), kept as
/// plain JSON so repository implementations stay decoupled from the
/// compiler's internal types.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub filter: Option<JsonValue>,
    /// Sort field; `None` means the repository default (createdAt desc).
    pub sort_field: Option<String>,
    pub sort_descending: bool,
    /// Lowercase string comparison for the sort field.
    pub sort_case_insensitive: bool,
    pub skip: i64,
    /// `None` means no limit (fetch all matching, e.g. for ranking).
    pub limit: Option<i64>,
}

/// Repository for business/property listings.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Run a compiled query, returning the page of listings and the total
    /// matching count (pre-pagination).
    async fn query(&self, query: &ListingQuery) -> Result<(Vec<Listing>, i64)>;
}
