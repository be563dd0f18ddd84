//! Centralized default constants for the funnelforge system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// JOB PROCESSING
// =============================================================================

/// Namespace prefix for job tokens in the shared state store.
///
/// Keeps job records clash-free alongside unrelated keys and enables
/// prefix-based inspection where the store supports key scanning.
pub const TOKEN_PREFIX: &str = "pending-request:";

/// Maximum attempts for externally-collaborating calls inside a worker.
pub const JOB_MAX_ATTEMPTS: u32 = 5;

/// Base delay between retry attempts (milliseconds, doubled per attempt).
pub const RETRY_BASE_DELAY_MS: u64 = 250;

/// Maximum backoff delay between retry attempts (milliseconds).
pub const RETRY_MAX_DELAY_MS: u64 = 5_000;

/// Time-to-live for job records in the state store (seconds).
///
/// Fire-and-forget flows rely on expiry for cleanup; single-consumption
/// flows delete on first terminal read and use the TTL as a backstop.
pub const JOB_RECORD_TTL_SECS: u64 = 3_600;

// =============================================================================
// RELEVANCE RANKING
// =============================================================================

/// Minimum similarity score required for a candidate to appear in results.
pub const RELEVANCE_CUTOFF: f32 = 0.1;

/// Additive score bonus for exclusive-tier candidates (clamped to 1.0).
pub const EXCLUSIVE_BOOST: f32 = 0.2;

/// Default number of matches returned by the listing-match worker.
pub const MATCH_LIMIT: usize = 20;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for list endpoints.
pub const PAGE_LIMIT: i64 = 10;

/// Default page number (1-based).
pub const PAGE_DEFAULT: i64 = 1;

/// Default sort field when no `sort` parameter is supplied.
pub const SORT_DEFAULT_FIELD: &str = "createdAt";

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Maximum request body size in bytes (2 MB; page HTML payloads are small).
pub const MAX_BODY_SIZE_BYTES: usize = 2 * 1024 * 1024;

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Default Redis connection URL for the state store.
pub const REDIS_URL: &str = "redis://localhost:6379";

/// Timeout for page-fetching requests in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Placeholder substituted for redacted listing fields when the caller's
/// budget tier lacks entitlement.
pub const REDACTED_PLACEHOLDER: &str = "Upgrade to view";
