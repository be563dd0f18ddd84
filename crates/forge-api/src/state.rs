//! Application state shared across handlers.

use std::sync::Arc;

use forge_core::{
    ChatBackend, EmbeddingBackend, FileStore, ListingRepository, PageFetcher, PageRepository,
    ScreenshotRenderer,
};
use forge_jobs::JobDispatcher;

/// Global rate limiter type (direct quota, no keyed bucketing).
pub type GlobalRateLimiter = governor::RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Shared application state: the job dispatcher plus every collaborator
/// the workers are wired with.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: JobDispatcher,
    pub fetcher: Arc<dyn PageFetcher>,
    pub renderer: Arc<dyn ScreenshotRenderer>,
    pub files: Arc<dyn FileStore>,
    pub pages: Arc<dyn PageRepository>,
    pub chat: Arc<dyn ChatBackend>,
    pub embeddings: Arc<dyn EmbeddingBackend>,
    pub listings: Arc<dyn ListingRepository>,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}
