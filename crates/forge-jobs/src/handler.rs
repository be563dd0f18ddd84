//! Worker contract: the shape every long-running operation implements.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use forge_core::{Error, JobKind, Result};

/// Context provided to job handlers.
///
/// All communication back to the caller happens through the state store;
/// the HTTP response for the triggering request has already been sent by
/// the time a handler runs.
pub struct JobContext {
    /// The token identifying this job in the state store.
    pub token: String,
    pub kind: JobKind,
    /// Snapshot of the originating request payload.
    pub input: JsonValue,
}

impl JobContext {
    pub fn new(token: String, kind: JobKind, input: JsonValue) -> Self {
        Self { token, kind, input }
    }

    /// Deserialize the input payload into the handler's typed request.
    pub fn parse_input<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.input.clone())
            .map_err(|e| Error::InvalidInput(format!("job payload: {}", e)))
    }
}

/// Result of job execution.
///
/// Handlers convert every fault into `Failed`; an exception never escapes
/// the worker boundary.
#[derive(Debug)]
pub enum JobResult {
    /// Job completed; the payload becomes the record's `response`.
    Success(JsonValue),
    /// Job failed with a human-readable message.
    Failed(String),
}

/// Trait for background job handlers.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The job kind this handler processes.
    fn kind(&self) -> JobKind;

    /// Execute the job. Must attempt exactly one logical completion and
    /// best-effort roll back any partially-created entities before
    /// returning `Failed`.
    async fn execute(&self, ctx: JobContext) -> JobResult;
}

/// No-op handler for tests.
pub struct NoOpHandler {
    kind: JobKind,
}

impl NoOpHandler {
    pub fn new(kind: JobKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl JobHandler for NoOpHandler {
    fn kind(&self) -> JobKind {
        self.kind
    }

    async fn execute(&self, ctx: JobContext) -> JobResult {
        JobResult::Success(serde_json::json!({ "echo": ctx.input }))
    }
}
