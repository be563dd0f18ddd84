//! Listing-match endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use forge_core::{Error, MatchListingsRequest, TokenResponse};
use forge_filter::compile_filter;
use forge_jobs::{JobHandler, ListingMatchHandler};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /matches`: queue a thesis-vs-listings similarity match.
///
/// Filter compilation runs here as well as in the worker so malformed
/// input (an empty regex, say) surfaces as a synchronous 400 before any
/// token is issued.
pub async fn match_listings(
    State(state): State<AppState>,
    Json(req): Json<MatchListingsRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    if req.thesis.trim().is_empty() {
        return Err(Error::InvalidInput("thesis must not be empty".into()).into());
    }
    compile_filter(&req.filters, &[])?;

    let handler: Arc<dyn JobHandler> = Arc::new(ListingMatchHandler::new(
        state.embeddings.clone(),
        state.listings.clone(),
    ));
    let token = state
        .dispatcher
        .submit(handler, serde_json::to_value(&req).map_err(Error::from)?)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(TokenResponse { token })))
}
