//! # forge-api
//!
//! HTTP API server for funnelforge.
//!
//! Job-creating endpoints (`/pages/clone`, `/funnels/generate`,
//! `/chat/completions`, `/matches`) respond immediately with a
//! `pending-request:` token while a detached worker runs; clients poll
//! `GET /requests/{token}` for the terminal state. `GET /listings`
//! exposes the filter grammar over the listing repository.

pub mod collaborators;
pub mod error;
pub mod handlers;
pub mod state;

use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{extract::Request, extract::State, Json, Router};
use utoipa::OpenApi;

pub use state::AppState;

/// OpenAPI document for the public surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Funnelforge API",
        version = "2026.1.4",
        description = "Funnel builder backend: async job orchestration, listing search, and semantic matching"
    ),
    components(schemas(
        forge_core::TokenResponse,
        forge_core::ClonePageRequest,
        forge_core::GenerateFunnelRequest,
        forge_core::ChatCompletionRequest,
        forge_core::ChatMessage,
        forge_core::MatchListingsRequest,
        forge_core::RankedMatch,
        forge_core::JobStatus,
        forge_core::JobKind,
    ))
)]
pub struct ApiDoc;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/pages/clone", post(handlers::clone_page))
        .route("/funnels/generate", post(handlers::generate_funnel))
        .route("/chat/completions", post(handlers::create_chat_completion))
        .route("/matches", post(handlers::match_listings))
        .route("/requests/:token", get(handlers::poll_request))
        .route("/listings", get(handlers::list_listings))
        .route("/health", get(health))
        .route("/openapi.json", get(openapi))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi() -> Json<serde_json::Value> {
    Json(serde_json::to_value(ApiDoc::openapi()).unwrap_or_default())
}

/// Global rate limit; disabled when no limiter is configured.
async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }
    Ok(next.run(request).await)
}
