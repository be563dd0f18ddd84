//! Core data models for funnelforge.
//!
//! These types are shared across all funnelforge crates and represent
//! the core domain entities.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// =============================================================================
// JOB TYPES
// =============================================================================

/// Status of an asynchronous job.
///
/// `Processing` is the only initial state; `Completed` and `Error` are
/// terminal. No transition out of a terminal state exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Worker has not yet written a terminal state.
    Processing,
    /// Worker finished; `response` carries the payload.
    Completed,
    /// Worker failed; `error` carries the message.
    Error,
}

impl JobStatus {
    /// Whether this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// The long-running flows tracked through the job token protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Clone an external page into a new funnel page.
    PageClone,
    /// Crawl a source site and generate a funnel with screenshots.
    PageCrawl,
    /// Forward a chat conversation to the completion backend.
    ChatCompletion,
    /// Rank listings against a buyer thesis embedding.
    ListingMatch,
}

impl JobKind {
    /// Whether the terminal record is deleted on first successful poll read.
    ///
    /// Clone and crawl results are claimed exactly once by the page builder;
    /// chat and match results stay readable until the store TTL expires.
    pub fn single_consumption(&self) -> bool {
        matches!(self, JobKind::PageClone | JobKind::PageCrawl)
    }
}

/// The unit of asynchronous work tracking, serialized as JSON in the
/// state store under the job token.
///
/// Created synchronously by the request handler before any background work
/// starts, mutated exactly once more by the worker to a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct JobRecord {
    pub status: JobStatus,
    /// Which flow owns this token (drives single-consumption polling).
    pub kind: JobKind,
    /// Optional progress hint for polling clients (0 at creation).
    #[serde(default)]
    pub progress: i32,
    /// Snapshot of the originating request payload, kept for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<JsonValue>,
    /// Present only when `status == Completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<JsonValue>,
    /// Present only when `status == Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    /// Initial record written when a job is created.
    pub fn processing(kind: JobKind, input: Option<JsonValue>) -> Self {
        Self {
            status: JobStatus::Processing,
            kind,
            progress: 0,
            input,
            response: None,
            error: None,
        }
    }

    /// Terminal completed record.
    pub fn completed(kind: JobKind, response: JsonValue) -> Self {
        Self {
            status: JobStatus::Completed,
            kind,
            progress: 100,
            input: None,
            response: Some(response),
            error: None,
        }
    }

    /// Terminal error record.
    pub fn errored(kind: JobKind, message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            kind,
            progress: 0,
            input: None,
            response: None,
            error: Some(message.into()),
        }
    }
}

// =============================================================================
// MATCHING TYPES
// =============================================================================

/// A candidate entity for relevance ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub id: String,
    /// Stored embedding; candidates without one are skipped by ranking.
    pub embedding: Option<Vec<f32>>,
    /// Whether this candidate participates in the boosted "exclusive" tier.
    #[serde(default)]
    pub exclusive: bool,
    /// Entity-specific projection carried through to the ranked output.
    #[serde(default)]
    pub metadata: JsonValue,
}

/// Output of relevance ranking.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RankedMatch {
    pub id: String,
    /// Cosine similarity, optionally boosted, clamped to <= 1.0.
    pub score: f32,
    #[serde(default)]
    pub metadata: JsonValue,
}

/// A business/property listing record behind the listing repository.
///
/// The document is a flat JSON object (`business_name`, `city`, `budget`,
/// ...) so compiled filter expressions can be evaluated against it directly.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Listing {
    pub id: String,
    pub document: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub exclusive: bool,
}

impl Listing {
    /// View this listing as a ranking candidate.
    pub fn as_candidate(&self) -> MatchCandidate {
        MatchCandidate {
            id: self.id.clone(),
            embedding: self.embedding.clone(),
            exclusive: self.exclusive,
            metadata: self.document.clone(),
        }
    }
}

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Response returned immediately by every job-creating endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Request to clone an external page into a funnel.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ClonePageRequest {
    /// Source URL to clone.
    pub url: String,
    /// Funnel the cloned page is attached to.
    pub funnel_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Request to crawl a site and generate a funnel from it.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GenerateFunnelRequest {
    /// Root URL of the site to crawl.
    pub url: String,
    /// Name for the generated funnel.
    pub name: String,
    /// Page paths to include; defaults to the root page only.
    #[serde(default)]
    pub paths: Vec<String>,
}

/// One message in a chat-completion conversation.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Request for an asynchronous chat completion.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
}

/// Request to rank listings against a free-text buyer thesis.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MatchListingsRequest {
    /// Free-text buyer/seller criteria embedded by the worker.
    pub thesis: String,
    /// Optional raw filter parameters applied before ranking.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filters: serde_json::Map<String, JsonValue>,
    /// Maximum matches returned; defaults applied by the worker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// A page created by the clone/crawl workers.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreatePage {
    pub funnel_id: String,
    pub name: String,
    pub html: String,
    /// Stored screenshot/asset URL, if one was rendered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// A funnel created by the crawl worker.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateFunnel {
    pub name: String,
    pub source_url: String,
}
