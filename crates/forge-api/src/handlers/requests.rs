//! Polling endpoint for asynchronous job tokens.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value as JsonValue;

use forge_jobs::PollOutcome;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /requests/{token}`: read the current job state.
///
/// | State | Response |
/// |-------|----------|
/// | unknown token | 404 `{"error": "Request not found"}` |
/// | processing | 202 `{"status": "Still processing", "progress": n}` |
/// | completed | 200 `{"response": ...}` |
/// | error | 500 `{"error": message}` |
///
/// Single-consumption flows delete the record on the first terminal read,
/// so the next poll returns 404.
pub async fn poll_request(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<(StatusCode, Json<JsonValue>), ApiError> {
    let outcome = state.dispatcher.tracker().poll(&token).await?;
    Ok(poll_response(outcome))
}

/// Map a poll outcome onto its HTTP status and body.
pub fn poll_response(outcome: PollOutcome) -> (StatusCode, Json<JsonValue>) {
    match outcome {
        PollOutcome::NotFound => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Request not found" })),
        ),
        PollOutcome::Processing { progress } => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "status": "Still processing", "progress": progress })),
        ),
        PollOutcome::Completed { response } => {
            (StatusCode::OK, Json(serde_json::json!({ "response": response })))
        }
        PollOutcome::Error { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": message })),
        ),
    }
}
