//! Structured logging schema and field name constants for funnelforge.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (candidates, filter keys) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → job → sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "jobs", "store", "filter", "match"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "tracker", "page_clone", "redis", "rank"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create_job", "poll", "execute", "compile_filter"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Job token being operated on.
pub const TOKEN: &str = "token";

/// Job kind enum variant.
pub const JOB_KIND: &str = "job_kind";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Retry attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

/// Number of results returned by a query or ranking.
pub const RESULT_COUNT: &str = "result_count";

/// Number of candidates considered before cutoff filtering.
pub const CANDIDATE_COUNT: &str = "candidate_count";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
