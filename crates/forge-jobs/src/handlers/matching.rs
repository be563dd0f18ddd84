//! Listing-match worker: rank listings against a buyer thesis embedding.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use forge_core::{
    defaults, EmbeddingBackend, JobKind, ListingQuery, ListingRepository, MatchCandidate,
    MatchListingsRequest,
};
use forge_filter::compile_filter;
use forge_match::{rank, RankOptions};

use crate::handler::{JobContext, JobHandler, JobResult};
use crate::retry::with_retries;

/// Handler for listing-match jobs.
///
/// Embeds the free-text thesis, fetches candidates (optionally narrowed by
/// a compiled filter), and ranks them with the exclusive boost and
/// relevance cutoff.
pub struct ListingMatchHandler {
    embeddings: Arc<dyn EmbeddingBackend>,
    listings: Arc<dyn ListingRepository>,
    options: RankOptions,
}

impl ListingMatchHandler {
    pub fn new(embeddings: Arc<dyn EmbeddingBackend>, listings: Arc<dyn ListingRepository>) -> Self {
        Self {
            embeddings,
            listings,
            options: RankOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RankOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl JobHandler for ListingMatchHandler {
    fn kind(&self) -> JobKind {
        JobKind::ListingMatch
    }

    #[instrument(
        skip(self, ctx),
        fields(subsystem = "jobs", component = "listing_match", op = "execute")
    )]
    async fn execute(&self, ctx: JobContext) -> JobResult {
        let req: MatchListingsRequest = match ctx.parse_input() {
            Ok(r) => r,
            Err(e) => return JobResult::Failed(e.to_string()),
        };

        if req.thesis.trim().is_empty() {
            return JobResult::Failed("Match thesis must not be empty".into());
        }

        let query_vec = match with_retries("embed_thesis", defaults::JOB_MAX_ATTEMPTS, || {
            self.embeddings.embed(&req.thesis)
        })
        .await
        {
            Ok(v) => v,
            Err(e) => return JobResult::Failed(format!("Failed to embed thesis: {}", e)),
        };

        let filter = match compile_filter(&req.filters, &[]) {
            Ok(f) => f,
            Err(e) => return JobResult::Failed(format!("Invalid match filters: {}", e)),
        };
        let query = ListingQuery {
            filter: (!filter.is_empty()).then(|| filter.to_document()),
            ..Default::default()
        };

        let (listings, total) = match with_retries("query_listings", defaults::JOB_MAX_ATTEMPTS, || {
            self.listings.query(&query)
        })
        .await
        {
            Ok(result) => result,
            Err(e) => return JobResult::Failed(format!("Failed to load listings: {}", e)),
        };

        let candidates: Vec<MatchCandidate> =
            listings.iter().map(|l| l.as_candidate()).collect();
        let mut matches = match rank(&query_vec, &candidates, self.options) {
            Ok(m) => m,
            Err(e) => return JobResult::Failed(format!("Ranking failed: {}", e)),
        };
        matches.truncate(req.limit.unwrap_or(defaults::MATCH_LIMIT));

        info!(
            candidate_count = total,
            result_count = matches.len(),
            "listing match complete"
        );

        JobResult::Success(serde_json::json!({ "matches": matches }))
    }
}
