//! Asynchronous chat-completion endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use forge_core::{ChatCompletionRequest, Error, TokenResponse};
use forge_jobs::{ChatCompletionHandler, JobHandler};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /chat/completions`: queue a chat completion and return a token.
///
/// Completions can take tens of seconds; the caller polls
/// `/requests/{token}` instead of holding the connection open.
pub async fn create_chat_completion(
    State(state): State<AppState>,
    Json(req): Json<ChatCompletionRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    if req.messages.is_empty() {
        return Err(Error::InvalidInput("messages must not be empty".into()).into());
    }
    if req.messages.iter().any(|m| m.content.trim().is_empty()) {
        return Err(Error::InvalidInput("message content must not be empty".into()).into());
    }

    let handler: Arc<dyn JobHandler> = Arc::new(ChatCompletionHandler::new(state.chat.clone()));
    let token = state
        .dispatcher
        .submit(handler, serde_json::to_value(&req).map_err(Error::from)?)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(TokenResponse { token })))
}
