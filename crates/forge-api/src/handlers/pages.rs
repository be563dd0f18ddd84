//! Page cloning and funnel generation endpoints.
//!
//! Both seed a job record, spawn the detached worker, and return the
//! token immediately; the HTTP response and the background work are
//! decoupled.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use forge_core::{ClonePageRequest, Error, GenerateFunnelRequest, TokenResponse};
use forge_jobs::{JobHandler, PageCloneHandler, PageCrawlHandler};

use crate::error::ApiError;
use crate::state::AppState;

fn require(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)).into());
    }
    Ok(())
}

/// `POST /pages/clone`: clone an external page into a funnel.
pub async fn clone_page(
    State(state): State<AppState>,
    Json(req): Json<ClonePageRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    require("url", &req.url)?;
    require("funnel_id", &req.funnel_id)?;

    let handler: Arc<dyn JobHandler> = Arc::new(PageCloneHandler::new(
        state.fetcher.clone(),
        state.files.clone(),
        state.pages.clone(),
    ));
    let token = state
        .dispatcher
        .submit(handler, serde_json::to_value(&req).map_err(Error::from)?)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(TokenResponse { token })))
}

/// `POST /funnels/generate`: crawl a source site into a new funnel.
pub async fn generate_funnel(
    State(state): State<AppState>,
    Json(req): Json<GenerateFunnelRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    require("url", &req.url)?;
    require("name", &req.name)?;

    let handler: Arc<dyn JobHandler> = Arc::new(PageCrawlHandler::new(
        state.fetcher.clone(),
        state.renderer.clone(),
        state.files.clone(),
        state.pages.clone(),
    ));
    let token = state
        .dispatcher
        .submit(handler, serde_json::to_value(&req).map_err(Error::from)?)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(TokenResponse { token })))
}
