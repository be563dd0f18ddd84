//! Chat-completion worker: forward a conversation to the chat backend.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use forge_core::{defaults, ChatBackend, ChatCompletionRequest, JobKind};

use crate::handler::{JobContext, JobHandler, JobResult};
use crate::retry::with_retries;

/// Handler for asynchronous chat-completion jobs.
pub struct ChatCompletionHandler {
    backend: Arc<dyn ChatBackend>,
}

impl ChatCompletionHandler {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl JobHandler for ChatCompletionHandler {
    fn kind(&self) -> JobKind {
        JobKind::ChatCompletion
    }

    #[instrument(
        skip(self, ctx),
        fields(subsystem = "jobs", component = "chat_completion", op = "execute")
    )]
    async fn execute(&self, ctx: JobContext) -> JobResult {
        let req: ChatCompletionRequest = match ctx.parse_input() {
            Ok(r) => r,
            Err(e) => return JobResult::Failed(e.to_string()),
        };

        if req.messages.is_empty() {
            return JobResult::Failed("Chat completion requires at least one message".into());
        }

        let completion = match with_retries("chat_complete", defaults::JOB_MAX_ATTEMPTS, || {
            self.backend.complete(&req.messages)
        })
        .await
        {
            Ok(text) => text,
            Err(e) => return JobResult::Failed(format!("Chat completion failed: {}", e)),
        };

        JobResult::Success(serde_json::json!({
            "completion": completion,
            "model": self.backend.model_name(),
        }))
    }
}
