//! In-memory funnel/page repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use forge_core::{CreateFunnel, CreatePage, Error, PageRepository, Result};

/// In-process implementation of [`PageRepository`].
#[derive(Default)]
pub struct MemoryPageRepository {
    funnels: RwLock<HashMap<String, CreateFunnel>>,
    pages: RwLock<HashMap<String, CreatePage>>,
}

impl MemoryPageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn funnel_count(&self) -> usize {
        self.funnels.read().await.len()
    }

    pub async fn page_count(&self) -> usize {
        self.pages.read().await.len()
    }

    pub async fn get_page(&self, page_id: &str) -> Option<CreatePage> {
        self.pages.read().await.get(page_id).cloned()
    }
}

#[async_trait]
impl PageRepository for MemoryPageRepository {
    async fn create_funnel(&self, funnel: CreateFunnel) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.funnels.write().await.insert(id.clone(), funnel);
        Ok(id)
    }

    async fn delete_funnel(&self, funnel_id: &str) -> Result<()> {
        self.funnels
            .write()
            .await
            .remove(funnel_id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("funnel {}", funnel_id)))
    }

    async fn create_page(&self, page: CreatePage) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.pages.write().await.insert(id.clone(), page);
        Ok(id)
    }

    async fn delete_page(&self, page_id: &str) -> Result<()> {
        self.pages
            .write()
            .await
            .remove(page_id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("page {}", page_id)))
    }
}
