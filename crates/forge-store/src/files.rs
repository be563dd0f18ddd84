//! In-memory file store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use forge_core::{Error, FileStore, Result};

/// In-process implementation of [`FileStore`].
///
/// `fail_puts` lets tests simulate a storage outage mid-flow (used to
/// exercise worker rollback paths).
#[derive(Default)]
pub struct MemoryFileStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    fail_puts: AtomicBool,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `put` calls fail with a transient store error.
    pub fn set_failing(&self, failing: bool) {
        self.fail_puts.store(failing, Ordering::SeqCst);
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).cloned()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::Store("file store unavailable".into()));
        }
        self.objects.write().await.insert(key.to_string(), bytes);
        Ok(format!("memory://{}", key))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_returns_url_and_stores_bytes() {
        let store = MemoryFileStore::new();
        let url = store.put("pages/p1/shot.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(url, "memory://pages/p1/shot.png");
        assert_eq!(store.get("pages/p1/shot.png").await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_failing_store_rejects_puts() {
        let store = MemoryFileStore::new();
        store.set_failing(true);
        assert!(store.put("k", vec![]).await.is_err());
        store.set_failing(false);
        assert!(store.put("k", vec![]).await.is_ok());
    }

    #[tokio::test]
    async fn test_remove_is_best_effort() {
        let store = MemoryFileStore::new();
        assert!(store.remove("absent").await.is_ok());
    }
}
