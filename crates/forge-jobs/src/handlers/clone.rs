//! Page-clone worker: fetch an external page and attach it to a funnel.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};

use forge_core::{
    defaults, ClonePageRequest, CreatePage, FileStore, JobKind, PageFetcher, PageRepository,
};

use crate::handler::{JobContext, JobHandler, JobResult};
use crate::retry::with_retries;

/// Handler for page-clone jobs.
pub struct PageCloneHandler {
    fetcher: Arc<dyn PageFetcher>,
    files: Arc<dyn FileStore>,
    pages: Arc<dyn PageRepository>,
}

impl PageCloneHandler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        files: Arc<dyn FileStore>,
        pages: Arc<dyn PageRepository>,
    ) -> Self {
        Self {
            fetcher,
            files,
            pages,
        }
    }

    /// Derive a page name from the source URL when none was supplied.
    fn page_name(req: &ClonePageRequest) -> String {
        if let Some(name) = &req.name {
            return name.clone();
        }
        req.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && !s.contains('.'))
            .unwrap_or("Cloned page")
            .to_string()
    }
}

#[async_trait]
impl JobHandler for PageCloneHandler {
    fn kind(&self) -> JobKind {
        JobKind::PageClone
    }

    #[instrument(
        skip(self, ctx),
        fields(subsystem = "jobs", component = "page_clone", op = "execute")
    )]
    async fn execute(&self, ctx: JobContext) -> JobResult {
        let req: ClonePageRequest = match ctx.parse_input() {
            Ok(r) => r,
            Err(e) => return JobResult::Failed(e.to_string()),
        };

        let html = match with_retries("fetch_html", defaults::JOB_MAX_ATTEMPTS, || {
            self.fetcher.fetch_html(&req.url)
        })
        .await
        {
            Ok(h) => h,
            Err(e) => return JobResult::Failed(format!("Failed to fetch source page: {}", e)),
        };

        let page = CreatePage {
            funnel_id: req.funnel_id.clone(),
            name: Self::page_name(&req),
            html: html.clone(),
            thumbnail_url: None,
        };
        let page_id = match with_retries("create_page", defaults::JOB_MAX_ATTEMPTS, || {
            self.pages.create_page(page.clone())
        })
        .await
        {
            Ok(id) => id,
            Err(e) => return JobResult::Failed(format!("Failed to create page: {}", e)),
        };

        // Archive the fetched source alongside the page for later diffing.
        let snapshot_key = format!("pages/{}/source.html", page_id);
        let snapshot_url = match with_retries("store_snapshot", defaults::JOB_MAX_ATTEMPTS, || {
            self.files.put(&snapshot_key, html.clone().into_bytes())
        })
        .await
        {
            Ok(url) => url,
            Err(e) => {
                // Compensate for the partially-created page before reporting.
                if let Err(rollback_err) = self.pages.delete_page(&page_id).await {
                    warn!(page_id = %page_id, error = %rollback_err, "rollback of cloned page failed");
                }
                return JobResult::Failed(format!("Failed to store page snapshot: {}", e));
            }
        };

        JobResult::Success(serde_json::json!({
            "page_id": page_id,
            "funnel_id": req.funnel_id,
            "snapshot_url": snapshot_url,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FailingPageFetcher, MockPageFetcher};
    use forge_store::{MemoryFileStore, MemoryPageRepository};
    use serde_json::json;

    fn ctx(input: serde_json::Value) -> JobContext {
        JobContext::new("pending-request:t".into(), JobKind::PageClone, input)
    }

    #[tokio::test]
    async fn test_clone_happy_path() {
        let pages = Arc::new(MemoryPageRepository::new());
        let handler = PageCloneHandler::new(
            Arc::new(MockPageFetcher::new().with_page("https://src.test/pricing", "<html/>")),
            Arc::new(MemoryFileStore::new()),
            pages.clone(),
        );

        let result = handler
            .execute(ctx(json!({"url": "https://src.test/pricing", "funnel_id": "f1"})))
            .await;

        let payload = match result {
            JobResult::Success(p) => p,
            JobResult::Failed(m) => panic!("unexpected failure: {}", m),
        };
        assert_eq!(payload["funnel_id"], "f1");
        assert!(payload["snapshot_url"].as_str().unwrap().starts_with("memory://"));
        assert_eq!(pages.page_count().await, 1);

        let page_id = payload["page_id"].as_str().unwrap();
        let page = pages.get_page(page_id).await.unwrap();
        assert_eq!(page.name, "pricing");
        assert_eq!(page.html, "<html/>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clone_retry_exhaustion_writes_failure() {
        let fetcher = Arc::new(FailingPageFetcher::new());
        let handler = PageCloneHandler::new(
            fetcher.clone(),
            Arc::new(MemoryFileStore::new()),
            Arc::new(MemoryPageRepository::new()),
        );

        let result = handler
            .execute(ctx(json!({"url": "https://down.test", "funnel_id": "f1"})))
            .await;

        match result {
            JobResult::Failed(message) => {
                assert!(message.contains("failed after 5 attempts"), "{}", message);
            }
            JobResult::Success(_) => panic!("expected failure"),
        }
        assert_eq!(fetcher.call_count(), 5);
    }

    #[tokio::test]
    async fn test_clone_permanent_fault_short_circuits() {
        let fetcher = Arc::new(MockPageFetcher::new()); // no pages registered
        let handler = PageCloneHandler::new(
            fetcher.clone(),
            Arc::new(MemoryFileStore::new()),
            Arc::new(MemoryPageRepository::new()),
        );

        let result = handler
            .execute(ctx(json!({"url": "https://missing.test", "funnel_id": "f1"})))
            .await;

        assert!(matches!(result, JobResult::Failed(_)));
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clone_rolls_back_page_on_snapshot_failure() {
        let pages = Arc::new(MemoryPageRepository::new());
        let files = Arc::new(MemoryFileStore::new());
        files.set_failing(true);

        let handler = PageCloneHandler::new(
            Arc::new(MockPageFetcher::new().with_page("https://src.test", "<html/>")),
            files,
            pages.clone(),
        );

        let result = handler
            .execute(ctx(json!({"url": "https://src.test", "funnel_id": "f1"})))
            .await;

        match result {
            JobResult::Failed(message) => {
                assert!(message.contains("snapshot"), "{}", message);
            }
            JobResult::Success(_) => panic!("expected failure"),
        }
        // The partially-created page was compensated away.
        assert_eq!(pages.page_count().await, 0);
    }

    #[tokio::test]
    async fn test_clone_malformed_input_fails_without_collaborator_calls() {
        let fetcher = Arc::new(MockPageFetcher::new());
        let handler = PageCloneHandler::new(
            fetcher.clone(),
            Arc::new(MemoryFileStore::new()),
            Arc::new(MemoryPageRepository::new()),
        );

        let result = handler.execute(ctx(json!({"nope": true}))).await;
        assert!(matches!(result, JobResult::Failed(_)));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[test]
    fn test_page_name_derivation() {
        let named = ClonePageRequest {
            url: "https://a.test/x".into(),
            funnel_id: "f".into(),
            name: Some("Landing".into()),
        };
        assert_eq!(PageCloneHandler::page_name(&named), "Landing");

        let from_path = ClonePageRequest {
            url: "https://a.test/pricing/".into(),
            funnel_id: "f".into(),
            name: None,
        };
        assert_eq!(PageCloneHandler::page_name(&from_path), "pricing");

        let fallback = ClonePageRequest {
            url: "https://a.test/index.html".into(),
            funnel_id: "f".into(),
            name: None,
        };
        assert_eq!(PageCloneHandler::page_name(&fallback), "Cloned page");
    }
}
