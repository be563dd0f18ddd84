//! Job token protocol: token generation and record tracking.
//!
//! The request handler that creates a record is the sole writer of the
//! initial state; the spawned worker is the sole writer of the terminal
//! state; polling clients only read (and, for single-consumption flows,
//! trigger the delete on first terminal read).

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value as JsonValue;
use tracing::{debug, instrument};
use uuid::Uuid;

use forge_core::{defaults, JobKind, JobRecord, JobStatus, Result, StateStore};

/// Generate a fresh namespaced job token.
///
/// UUIDv4 collision probability is negligible; duplicate-token reuse is an
/// assumed precondition, not a guarded invariant.
pub fn new_token() -> String {
    format!("{}{}", defaults::TOKEN_PREFIX, Uuid::new_v4())
}

/// Current state of a job as observed by a polling client.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// No record exists for the token (unknown, expired, or consumed).
    NotFound,
    Processing {
        progress: i32,
    },
    Completed {
        response: JsonValue,
    },
    Error {
        message: String,
    },
}

/// Tracks job records in the shared state store.
#[derive(Clone)]
pub struct JobTracker {
    store: Arc<dyn StateStore>,
    ttl: Option<Duration>,
}

impl JobTracker {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            ttl: Some(Duration::from_secs(defaults::JOB_RECORD_TTL_SECS)),
        }
    }

    /// Override the record TTL (`None` disables expiry).
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Create a job: generate a token and synchronously persist the initial
    /// `processing` record **before** returning.
    ///
    /// If the persist fails the error propagates and no token escapes;
    /// a token is never handed out for a job that was never recorded.
    #[instrument(skip(self, input), fields(subsystem = "jobs", component = "tracker"))]
    pub async fn create(&self, kind: JobKind, input: Option<JsonValue>) -> Result<String> {
        let token = new_token();
        let record = JobRecord::processing(kind, input);
        self.write(&token, &record).await?;
        debug!(token = %token, ?kind, "job record created");
        Ok(token)
    }

    /// Write the terminal completed state (last write wins).
    pub async fn complete(&self, token: &str, kind: JobKind, response: JsonValue) -> Result<()> {
        self.write(token, &JobRecord::completed(kind, response)).await
    }

    /// Write the terminal error state (last write wins).
    pub async fn fail(&self, token: &str, kind: JobKind, message: &str) -> Result<()> {
        self.write(token, &JobRecord::errored(kind, message)).await
    }

    /// Read the raw record, if present.
    pub async fn read(&self, token: &str) -> Result<Option<JobRecord>> {
        match self.store.get(token).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Read the record as a polling client.
    ///
    /// Terminal reads of single-consumption kinds delete the record, so a
    /// subsequent poll observes `NotFound`. Non-single-consumption terminal
    /// records poll identically every time until the store TTL removes them.
    pub async fn poll(&self, token: &str) -> Result<PollOutcome> {
        let Some(record) = self.read(token).await? else {
            return Ok(PollOutcome::NotFound);
        };

        let outcome = match record.status {
            JobStatus::Processing => PollOutcome::Processing {
                progress: record.progress,
            },
            JobStatus::Completed => PollOutcome::Completed {
                response: record.response.unwrap_or(JsonValue::Null),
            },
            JobStatus::Error => PollOutcome::Error {
                message: record
                    .error
                    .unwrap_or_else(|| "unknown job error".to_string()),
            },
        };

        if record.status.is_terminal() && record.kind.single_consumption() {
            self.store.delete(token).await?;
            debug!(token = %token, "single-consumption record deleted on terminal read");
        }

        Ok(outcome)
    }

    async fn write(&self, token: &str, record: &JobRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        self.store.set(token, &payload, self.ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_store::MemoryStateStore;
    use serde_json::json;
    use std::collections::HashSet;

    fn tracker() -> JobTracker {
        JobTracker::new(Arc::new(MemoryStateStore::new()))
    }

    #[test]
    fn test_tokens_are_namespaced() {
        assert!(new_token().starts_with("pending-request:"));
    }

    #[test]
    fn test_token_uniqueness() {
        let tokens: HashSet<String> = (0..10_000).map(|_| new_token()).collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[tokio::test]
    async fn test_create_then_poll_is_processing() {
        let tracker = tracker();
        let token = tracker
            .create(JobKind::ChatCompletion, Some(json!({"q": 1})))
            .await
            .unwrap();

        // Immediately after create, polling never observes a terminal state
        assert_eq!(
            tracker.poll(&token).await.unwrap(),
            PollOutcome::Processing { progress: 0 }
        );
    }

    #[tokio::test]
    async fn test_create_snapshots_input() {
        let tracker = tracker();
        let token = tracker
            .create(JobKind::PageClone, Some(json!({"url": "https://a.test"})))
            .await
            .unwrap();

        let record = tracker.read(&token).await.unwrap().unwrap();
        assert_eq!(record.input, Some(json!({"url": "https://a.test"})));
    }

    #[tokio::test]
    async fn test_poll_unknown_token_is_not_found() {
        let tracker = tracker();
        assert_eq!(
            tracker.poll("pending-request:nope").await.unwrap(),
            PollOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_completed_poll_returns_response() {
        let tracker = tracker();
        let token = tracker.create(JobKind::ListingMatch, None).await.unwrap();
        tracker
            .complete(&token, JobKind::ListingMatch, json!({"matches": [1, 2]}))
            .await
            .unwrap();

        assert_eq!(
            tracker.poll(&token).await.unwrap(),
            PollOutcome::Completed {
                response: json!({"matches": [1, 2]})
            }
        );
    }

    #[tokio::test]
    async fn test_error_poll_returns_message() {
        let tracker = tracker();
        let token = tracker.create(JobKind::ChatCompletion, None).await.unwrap();
        tracker
            .fail(&token, JobKind::ChatCompletion, "backend unreachable")
            .await
            .unwrap();

        assert_eq!(
            tracker.poll(&token).await.unwrap(),
            PollOutcome::Error {
                message: "backend unreachable".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_last_terminal_write_wins_and_polls_stably() {
        let tracker = tracker();
        let token = tracker.create(JobKind::ListingMatch, None).await.unwrap();

        tracker
            .complete(&token, JobKind::ListingMatch, json!({"ok": true}))
            .await
            .unwrap();
        tracker
            .fail(&token, JobKind::ListingMatch, "late failure")
            .await
            .unwrap();

        // Whichever write happened last is the observable state,
        // and repeated polls return identical content.
        let first = tracker.poll(&token).await.unwrap();
        let second = tracker.poll(&token).await.unwrap();
        assert_eq!(
            first,
            PollOutcome::Error {
                message: "late failure".to_string()
            }
        );
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_single_consumption_deletes_on_terminal_read() {
        let tracker = tracker();
        let token = tracker.create(JobKind::PageClone, None).await.unwrap();
        tracker
            .complete(&token, JobKind::PageClone, json!({"page_id": "p1"}))
            .await
            .unwrap();

        assert!(matches!(
            tracker.poll(&token).await.unwrap(),
            PollOutcome::Completed { .. }
        ));
        // Consumed: the record is gone
        assert_eq!(tracker.poll(&token).await.unwrap(), PollOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_single_consumption_not_triggered_while_processing() {
        let tracker = tracker();
        let token = tracker.create(JobKind::PageClone, None).await.unwrap();

        for _ in 0..3 {
            assert!(matches!(
                tracker.poll(&token).await.unwrap(),
                PollOutcome::Processing { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_non_single_consumption_reads_are_idempotent() {
        let tracker = tracker();
        let token = tracker.create(JobKind::ChatCompletion, None).await.unwrap();
        tracker
            .complete(&token, JobKind::ChatCompletion, json!({"completion": "hi"}))
            .await
            .unwrap();

        for _ in 0..3 {
            assert_eq!(
                tracker.poll(&token).await.unwrap(),
                PollOutcome::Completed {
                    response: json!({"completion": "hi"})
                }
            );
        }
    }
}
