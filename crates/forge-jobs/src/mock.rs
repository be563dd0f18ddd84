//! Mock collaborator backends for tests.
//!
//! Deterministic, scriptable implementations of the external-collaborator
//! traits so worker behavior (retry bounds, rollback, terminal writes) can
//! be exercised without network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use forge_core::{
    ChatBackend, ChatMessage, EmbeddingBackend, Error, PageFetcher, Result, ScreenshotRenderer,
};

// =============================================================================
// PAGE FETCHING
// =============================================================================

/// Page fetcher serving a fixed URL → HTML map.
///
/// Unknown URLs return a permanent `NotFound` (retries short-circuit).
#[derive(Default)]
pub struct MockPageFetcher {
    pages: HashMap<String, String>,
    calls: Arc<AtomicU32>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("page {}", url)))
    }
}

/// Page fetcher that always fails with a transient error, counting calls.
#[derive(Default)]
pub struct FailingPageFetcher {
    calls: Arc<AtomicU32>,
}

impl FailingPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn call_counter(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }
}

#[async_trait]
impl PageFetcher for FailingPageFetcher {
    async fn fetch_html(&self, _url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Request("connection refused".into()))
    }
}

// =============================================================================
// SCREENSHOT RENDERING
// =============================================================================

/// Renderer returning fixed bytes, optionally failing after N successes.
pub struct MockScreenshotRenderer {
    bytes: Vec<u8>,
    fail_after: Option<u32>,
    calls: AtomicU32,
}

impl Default for MockScreenshotRenderer {
    fn default() -> Self {
        Self {
            bytes: vec![0x89, b'P', b'N', b'G'],
            fail_after: None,
            calls: AtomicU32::new(0),
        }
    }
}

impl MockScreenshotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every render after the first `n` successful calls.
    pub fn fail_after(mut self, n: u32) -> Self {
        self.fail_after = Some(n);
        self
    }
}

#[async_trait]
impl ScreenshotRenderer for MockScreenshotRenderer {
    async fn render(&self, _url: &str) -> Result<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| call >= n) {
            return Err(Error::Request("renderer unavailable".into()));
        }
        Ok(self.bytes.clone())
    }
}

// =============================================================================
// CHAT / EMBEDDING
// =============================================================================

/// Chat backend returning a fixed reply, optionally flaky for the first
/// `fail_first` calls (transient errors).
pub struct MockChatBackend {
    reply: String,
    fail_first: u32,
    calls: AtomicU32,
}

impl MockChatBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            fail_first: 0,
            calls: AtomicU32::new(0),
        }
    }

    pub fn flaky(mut self, fail_first: u32) -> Self {
        self.fail_first = fail_first;
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(Error::Completion("upstream overloaded".into()));
        }
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

/// Embedding backend serving scripted vectors with a configurable fallback.
pub struct MockEmbeddingBackend {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
}

impl MockEmbeddingBackend {
    pub fn new(fallback: Vec<f32>) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback,
        }
    }

    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}
