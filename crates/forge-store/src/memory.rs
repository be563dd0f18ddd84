//! In-memory state store for tests and single-instance deployments.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use forge_core::{Result, StateStore};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process implementation of [`StateStore`].
///
/// Does not survive process restarts or horizontal scaling; production
/// deployments use [`crate::RedisStateStore`]. Expired entries are dropped
/// lazily on read.
#[derive(Default)]
pub struct MemoryStateStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries, for diagnostics.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {} // expired, fall through to remove
                None => return Ok(None),
            }
        }
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired()) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|t| Instant::now() + t),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}
