//! forge-api - HTTP API server for funnelforge

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use governor::{Quota, RateLimiter};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use forge_api::collaborators::{
    HttpChatBackend, HttpEmbeddingBackend, HttpPageFetcher, HttpScreenshotRenderer,
};
use forge_api::state::GlobalRateLimiter;
use forge_api::{router, AppState};
use forge_core::{defaults, Listing, StateStore};
use forge_jobs::{JobDispatcher, JobTracker};
use forge_store::{
    MemoryFileStore, MemoryListingRepository, MemoryPageRepository, MemoryStateStore,
    RedisStateStore,
};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically, which helps
/// with log correlation and debugging production incidents.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // State store: Redis by default so any instance can serve a poll;
    // STATE_STORE=memory for single-instance deployments.
    let store: Arc<dyn StateStore> = match std::env::var("STATE_STORE").as_deref() {
        Ok("memory") => {
            info!("using in-memory state store");
            Arc::new(MemoryStateStore::new())
        }
        _ => Arc::new(RedisStateStore::from_env().await?),
    };
    let dispatcher = JobDispatcher::new(JobTracker::new(store));

    let state = AppState {
        dispatcher,
        fetcher: Arc::new(HttpPageFetcher::new()?),
        renderer: Arc::new(HttpScreenshotRenderer::from_env()?),
        files: Arc::new(MemoryFileStore::new()),
        pages: Arc::new(MemoryPageRepository::new()),
        chat: Arc::new(HttpChatBackend::from_env()?),
        embeddings: Arc::new(HttpEmbeddingBackend::from_env()?),
        listings: Arc::new(listings_from_env()),
        rate_limiter: rate_limiter_from_env(),
    };

    let app = router(state)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(cors_from_env())
        .layer(RequestBodyLimitLayer::new(defaults::MAX_BODY_SIZE_BYTES));

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::SERVER_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "forge-api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Seed the listing repository from `LISTINGS_PATH` (a JSON array of
/// listings), or start empty.
fn listings_from_env() -> MemoryListingRepository {
    let Ok(path) = std::env::var("LISTINGS_PATH") else {
        return MemoryListingRepository::new();
    };
    match std::fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|raw| serde_json::from_str::<Vec<Listing>>(&raw).map_err(Into::into))
    {
        Ok(listings) => {
            info!(path = %path, count = listings.len(), "seeded listings");
            MemoryListingRepository::seeded(listings)
        }
        Err(e) => {
            warn!(path = %path, error = %e, "failed to seed listings, starting empty");
            MemoryListingRepository::new()
        }
    }
}

/// Build the global rate limiter from `RATE_LIMIT_ENABLED`,
/// `RATE_LIMIT_REQUESTS`, and `RATE_LIMIT_PERIOD_SECS`.
fn rate_limiter_from_env() -> Option<Arc<GlobalRateLimiter>> {
    let enabled = std::env::var("RATE_LIMIT_ENABLED")
        .map(|v| v != "false" && v != "0")
        .unwrap_or(true);
    if !enabled {
        info!("rate limiting disabled via RATE_LIMIT_ENABLED=false");
        return None;
    }

    let requests: u32 = std::env::var("RATE_LIMIT_REQUESTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::RATE_LIMIT_REQUESTS as u32)
        .max(1);
    let period_secs: u64 = std::env::var("RATE_LIMIT_PERIOD_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::RATE_LIMIT_PERIOD_SECS)
        .max(1);

    let per_request = Duration::from_secs(period_secs) / requests;
    let quota = Quota::with_period(per_request)?.allow_burst(NonZeroU32::new(requests)?);
    info!(requests, period_secs, "rate limiting enabled");
    Some(Arc::new(RateLimiter::direct(quota)))
}

/// CORS from `CORS_ALLOWED_ORIGINS` (comma-separated; unset or `*` allows
/// any origin).
fn cors_from_env() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .max_age(Duration::from_secs(defaults::CORS_MAX_AGE_SECS));

    match std::env::var("CORS_ALLOWED_ORIGINS") {
        Ok(origins) if origins.trim() != "*" && !origins.trim().is_empty() => {
            let list: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            base.allow_origin(AllowOrigin::list(list))
        }
        _ => base.allow_origin(Any),
    }
}
