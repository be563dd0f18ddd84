//! Fire-and-forget job dispatch.
//!
//! The HTTP handler submits a job and returns the token without awaiting
//! the worker; the spawned task writes exactly one terminal state through
//! the tracker. Errors on the terminal write are logged, never thrown, so
//! nothing escapes to the process-level unhandled-error path.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use forge_core::Result;

use crate::handler::{JobContext, JobHandler, JobResult};
use crate::token::JobTracker;

/// Submits jobs and spawns their detached workers.
#[derive(Clone)]
pub struct JobDispatcher {
    tracker: JobTracker,
}

impl JobDispatcher {
    pub fn new(tracker: JobTracker) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    /// Seed the job record, spawn the worker, and return the token.
    ///
    /// The record persist happens before the spawn: if it fails, no worker
    /// starts and no token is returned (the request fails fast). The spawn
    /// itself is not awaited; the HTTP response and the background work
    /// are decoupled.
    pub async fn submit(&self, handler: Arc<dyn JobHandler>, input: JsonValue) -> Result<String> {
        let token = self.tracker.create(handler.kind(), Some(input.clone())).await?;
        self.dispatch(token.clone(), handler, input);
        Ok(token)
    }

    /// Spawn the detached worker task for an already-seeded token.
    pub fn dispatch(&self, token: String, handler: Arc<dyn JobHandler>, input: JsonValue) {
        let tracker = self.tracker.clone();
        tokio::spawn(async move {
            let start = Instant::now();
            let kind = handler.kind();
            let ctx = JobContext::new(token.clone(), kind, input);

            match handler.execute(ctx).await {
                JobResult::Success(payload) => {
                    if let Err(e) = tracker.complete(&token, kind, payload).await {
                        error!(token = %token, ?kind, error = %e, "failed to write completed state");
                    } else {
                        info!(
                            token = %token,
                            ?kind,
                            duration_ms = start.elapsed().as_millis() as u64,
                            "job completed"
                        );
                    }
                }
                JobResult::Failed(message) => {
                    if let Err(e) = tracker.fail(&token, kind, &message).await {
                        error!(token = %token, ?kind, error = %e, "failed to write error state");
                    } else {
                        warn!(
                            token = %token,
                            ?kind,
                            error = %message,
                            duration_ms = start.elapsed().as_millis() as u64,
                            "job failed"
                        );
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::NoOpHandler;
    use crate::token::PollOutcome;
    use async_trait::async_trait;
    use forge_core::JobKind;
    use forge_store::MemoryStateStore;
    use serde_json::json;
    use tokio::sync::oneshot;
    use tokio::sync::Mutex;

    fn dispatcher() -> JobDispatcher {
        JobDispatcher::new(JobTracker::new(Arc::new(MemoryStateStore::new())))
    }

    /// Handler that blocks until released, so tests can observe the
    /// processing state deterministically.
    struct GatedHandler {
        kind: JobKind,
        release: Mutex<Option<oneshot::Receiver<()>>>,
        result: JobResult,
    }

    #[async_trait]
    impl JobHandler for GatedHandler {
        fn kind(&self) -> JobKind {
            self.kind
        }

        async fn execute(&self, _ctx: JobContext) -> JobResult {
            if let Some(rx) = self.release.lock().await.take() {
                let _ = rx.await;
            }
            match &self.result {
                JobResult::Success(v) => JobResult::Success(v.clone()),
                JobResult::Failed(m) => JobResult::Failed(m.clone()),
            }
        }
    }

    #[tokio::test]
    async fn test_submit_returns_before_worker_finishes() {
        let dispatcher = dispatcher();
        let (tx, rx) = oneshot::channel();
        let handler = Arc::new(GatedHandler {
            kind: JobKind::ChatCompletion,
            release: Mutex::new(Some(rx)),
            result: JobResult::Success(json!({"ok": true})),
        });

        let token = dispatcher.submit(handler, json!({})).await.unwrap();

        // The worker is still gated: the job must read as processing.
        assert!(matches!(
            dispatcher.tracker().poll(&token).await.unwrap(),
            PollOutcome::Processing { .. }
        ));

        tx.send(()).unwrap();
        tokio::task::yield_now().await;

        // Eventually terminal
        let mut outcome = dispatcher.tracker().poll(&token).await.unwrap();
        for _ in 0..100 {
            if !matches!(outcome, PollOutcome::Processing { .. }) {
                break;
            }
            tokio::task::yield_now().await;
            outcome = dispatcher.tracker().poll(&token).await.unwrap();
        }
        assert_eq!(
            outcome,
            PollOutcome::Completed {
                response: json!({"ok": true})
            }
        );
    }

    #[tokio::test]
    async fn test_failed_handler_writes_error_state() {
        let dispatcher = dispatcher();
        let handler = Arc::new(GatedHandler {
            kind: JobKind::ChatCompletion,
            release: Mutex::new(None),
            result: JobResult::Failed("boom".into()),
        });

        let token = dispatcher.submit(handler, json!({})).await.unwrap();

        let mut outcome = dispatcher.tracker().poll(&token).await.unwrap();
        for _ in 0..100 {
            if !matches!(outcome, PollOutcome::Processing { .. }) {
                break;
            }
            tokio::task::yield_now().await;
            outcome = dispatcher.tracker().poll(&token).await.unwrap();
        }
        assert_eq!(
            outcome,
            PollOutcome::Error {
                message: "boom".into()
            }
        );
    }

    #[tokio::test]
    async fn test_submit_records_input_snapshot() {
        let dispatcher = dispatcher();
        let handler = Arc::new(NoOpHandler::new(JobKind::ListingMatch));
        let token = dispatcher
            .submit(handler, json!({"thesis": "saas"}))
            .await
            .unwrap();

        // Token namespace per the protocol
        assert!(token.starts_with("pending-request:"));
    }
}
