//! HTTP-backed collaborator implementations.
//!
//! The workers only know the narrow traits in `forge_core`; these adapters
//! bind them to real services: plain HTTP for page fetching, a screenshot
//! rendering service, and an OpenAI-compatible API for chat completions
//! and embeddings.
//!
//! ## Configuration
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SCREENSHOT_API_URL` | `http://127.0.0.1:4000/render` | Screenshot renderer endpoint |
//! | `AI_API_URL` | `http://127.0.0.1:11434/v1` | OpenAI-compatible base URL |
//! | `AI_API_KEY` | unset | Optional bearer token |
//! | `CHAT_MODEL` | `gpt-oss:20b` | Chat completion model |
//! | `EMBED_MODEL` | `nomic-embed-text` | Embedding model |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use forge_core::{
    defaults, ChatBackend, ChatMessage, EmbeddingBackend, Error, PageFetcher, Result,
    ScreenshotRenderer,
};

fn permanent_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND
    )
}

fn status_error(context: &str, status: StatusCode) -> Error {
    if status == StatusCode::NOT_FOUND {
        Error::NotFound(format!("{}: upstream returned 404", context))
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Error::Unauthorized(format!("{}: upstream returned {}", context, status))
    } else if permanent_status(status) {
        Error::InvalidInput(format!("{}: upstream returned {}", context, status))
    } else {
        Error::Request(format!("{}: upstream returned {}", context, status))
    }
}

// =============================================================================
// PAGE FETCHER
// =============================================================================

/// Fetches page HTML over plain HTTP.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::FETCH_TIMEOUT_SECS))
            .user_agent("funnelforge/0.1")
            .build()
            .map_err(Error::from)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error("fetch_html", status));
        }
        Ok(response.text().await?)
    }
}

// =============================================================================
// SCREENSHOT RENDERER
// =============================================================================

/// Calls an external rendering service that screenshots a URL.
pub struct HttpScreenshotRenderer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpScreenshotRenderer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::FETCH_TIMEOUT_SECS))
            .build()
            .map_err(Error::from)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("SCREENSHOT_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:4000/render".to_string());
        Self::new(endpoint)
    }
}

#[async_trait]
impl ScreenshotRenderer for HttpScreenshotRenderer {
    async fn render(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error("render", status));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

// =============================================================================
// OPENAI-COMPATIBLE CHAT / EMBEDDINGS
// =============================================================================

/// Chat completions against an OpenAI-compatible endpoint.
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpChatBackend {
    pub fn from_env() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(Error::from)?;
        Ok(Self {
            client,
            base_url: ai_base_url(),
            model: std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-oss:20b".to_string()),
            api_key: std::env::var("AI_API_KEY").ok(),
        })
    }
}

fn ai_base_url() -> String {
    std::env::var("AI_API_URL").unwrap_or_else(|_| "http://127.0.0.1:11434/v1".to_string())
}

fn with_auth(
    request: reqwest::RequestBuilder,
    api_key: &Option<String>,
) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) => request.bearer_auth(key),
        None => request,
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });
        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        let response = with_auth(request, &self.api_key).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error("chat_completions", status));
        }

        let payload: serde_json::Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Completion("response missing choices[0].message.content".into()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Embeddings against an OpenAI-compatible endpoint.
pub struct HttpEmbeddingBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbeddingBackend {
    pub fn from_env() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(Error::from)?;
        Ok(Self {
            client,
            base_url: ai_base_url(),
            model: std::env::var("EMBED_MODEL").unwrap_or_else(|_| "nomic-embed-text".to_string()),
            api_key: std::env::var("AI_API_KEY").ok(),
        })
    }
}

#[async_trait]
impl EmbeddingBackend for HttpEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });
        let request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&body);
        let response = with_auth(request, &self.api_key).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error("embeddings", status));
        }

        let payload: serde_json::Value = response.json().await?;
        let vector = payload["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| Error::Embedding("response missing data[0].embedding".into()))?;
        vector
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| Error::Embedding("non-numeric embedding component".into()))
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            status_error("x", StatusCode::NOT_FOUND),
            Error::NotFound(_)
        ));
        assert!(matches!(
            status_error("x", StatusCode::UNAUTHORIZED),
            Error::Unauthorized(_)
        ));
        assert!(matches!(
            status_error("x", StatusCode::SERVICE_UNAVAILABLE),
            Error::Request(_)
        ));
        // 5xx stays retryable, 404 does not
        assert!(status_error("x", StatusCode::BAD_GATEWAY).is_retryable());
        assert!(!status_error("x", StatusCode::NOT_FOUND).is_retryable());
    }
}
