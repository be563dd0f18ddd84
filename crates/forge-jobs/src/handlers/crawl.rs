//! Page-crawl worker: crawl a source site and generate a funnel from it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};

use forge_core::{
    defaults, CreateFunnel, CreatePage, FileStore, GenerateFunnelRequest, JobKind, PageFetcher,
    PageRepository, ScreenshotRenderer,
};

use crate::handler::{JobContext, JobHandler, JobResult};
use crate::retry::with_retries;

/// Handler for funnel-generation (crawl) jobs.
///
/// Creates a funnel, then one page per requested path: fetch the HTML,
/// render a thumbnail screenshot into the file store, create the page.
/// Any failure after the funnel exists triggers a best-effort rollback of
/// everything created so far.
pub struct PageCrawlHandler {
    fetcher: Arc<dyn PageFetcher>,
    renderer: Arc<dyn ScreenshotRenderer>,
    files: Arc<dyn FileStore>,
    pages: Arc<dyn PageRepository>,
}

impl PageCrawlHandler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        renderer: Arc<dyn ScreenshotRenderer>,
        files: Arc<dyn FileStore>,
        pages: Arc<dyn PageRepository>,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            files,
            pages,
        }
    }

    fn join_url(base: &str, path: &str) -> String {
        if path.is_empty() {
            return base.to_string();
        }
        format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn page_name(path: &str) -> String {
        let segment = path.trim_matches('/').rsplit('/').next().unwrap_or("");
        if segment.is_empty() {
            "Home".to_string()
        } else {
            segment.to_string()
        }
    }

    /// Compensate for partially-created entities. Failures are logged and
    /// do not change the error reported for the job.
    async fn rollback(&self, funnel_id: &str, page_ids: &[String]) {
        for page_id in page_ids.iter().rev() {
            if let Err(e) = self.pages.delete_page(page_id).await {
                warn!(page_id = %page_id, error = %e, "rollback of crawled page failed");
            }
        }
        if let Err(e) = self.pages.delete_funnel(funnel_id).await {
            warn!(funnel_id = %funnel_id, error = %e, "rollback of generated funnel failed");
        }
    }
}

#[async_trait]
impl JobHandler for PageCrawlHandler {
    fn kind(&self) -> JobKind {
        JobKind::PageCrawl
    }

    #[instrument(
        skip(self, ctx),
        fields(subsystem = "jobs", component = "page_crawl", op = "execute")
    )]
    async fn execute(&self, ctx: JobContext) -> JobResult {
        let req: GenerateFunnelRequest = match ctx.parse_input() {
            Ok(r) => r,
            Err(e) => return JobResult::Failed(e.to_string()),
        };

        let funnel = CreateFunnel {
            name: req.name.clone(),
            source_url: req.url.clone(),
        };
        let funnel_id = match with_retries("create_funnel", defaults::JOB_MAX_ATTEMPTS, || {
            self.pages.create_funnel(funnel.clone())
        })
        .await
        {
            Ok(id) => id,
            Err(e) => return JobResult::Failed(format!("Failed to create funnel: {}", e)),
        };

        let paths = if req.paths.is_empty() {
            vec![String::new()]
        } else {
            req.paths.clone()
        };

        let mut created_pages: Vec<String> = Vec::with_capacity(paths.len());

        for (index, path) in paths.iter().enumerate() {
            let url = Self::join_url(&req.url, path);

            let html = match with_retries("fetch_html", defaults::JOB_MAX_ATTEMPTS, || {
                self.fetcher.fetch_html(&url)
            })
            .await
            {
                Ok(h) => h,
                Err(e) => {
                    self.rollback(&funnel_id, &created_pages).await;
                    return JobResult::Failed(format!("Failed to fetch {}: {}", url, e));
                }
            };

            let shot = match with_retries("render_screenshot", defaults::JOB_MAX_ATTEMPTS, || {
                self.renderer.render(&url)
            })
            .await
            {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.rollback(&funnel_id, &created_pages).await;
                    return JobResult::Failed(format!("Failed to render {}: {}", url, e));
                }
            };

            let thumb_key = format!("funnels/{}/pages/{}.png", funnel_id, index);
            let thumbnail_url = match with_retries("store_thumbnail", defaults::JOB_MAX_ATTEMPTS, || {
                self.files.put(&thumb_key, shot.clone())
            })
            .await
            {
                Ok(u) => u,
                Err(e) => {
                    self.rollback(&funnel_id, &created_pages).await;
                    return JobResult::Failed(format!("Failed to store thumbnail: {}", e));
                }
            };

            let page = CreatePage {
                funnel_id: funnel_id.clone(),
                name: Self::page_name(path),
                html,
                thumbnail_url: Some(thumbnail_url),
            };
            match with_retries("create_page", defaults::JOB_MAX_ATTEMPTS, || {
                self.pages.create_page(page.clone())
            })
            .await
            {
                Ok(page_id) => created_pages.push(page_id),
                Err(e) => {
                    self.rollback(&funnel_id, &created_pages).await;
                    return JobResult::Failed(format!("Failed to create page: {}", e));
                }
            }
        }

        JobResult::Success(serde_json::json!({
            "funnel_id": funnel_id,
            "page_ids": created_pages,
            "page_count": created_pages.len(),
        }))
    }
}
