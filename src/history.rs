//! Query history
//!
//! Most-recent-first, deduplicated list of submitted queries, persisted as a
//! JSON array under a fixed key in an injectable key-value store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::AnalyticsError;
use crate::Result;

pub const HISTORY_NAMESPACE: &str = "analytica-query-history";
pub const MAX_HISTORY_ENTRIES: usize = 50;

/// Trait for history persistence
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store for development and tests
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

/// One file per key under a directory; file names are the SHA-256 of the key
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            AnalyticsError::StorageError(format!(
                "cannot create history directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root.join(format!("{}.json", hex::encode(digest)))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-wide query history, read once at load and written on every change
pub struct QueryHistory {
    store: Arc<dyn KeyValueStore>,
    key: String,
    entries: RwLock<Vec<String>>,
}

impl QueryHistory {
    /// File-backed history when `HISTORY_DIR` is set, in-memory otherwise
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.history_dir {
            Some(dir) => Arc::new(FileKeyValueStore::open(dir.clone()).await?),
            None => Arc::new(InMemoryKeyValueStore::new()),
        };
        Ok(Self::load(store).await)
    }

    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        Self::load_with_key(store, HISTORY_NAMESPACE).await
    }

    pub async fn load_with_key(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        let entries = match store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(mut entries) => {
                    entries.truncate(MAX_HISTORY_ENTRIES);
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse stored history, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored history, starting empty");
                Vec::new()
            }
        };

        debug!(entries = entries.len(), "History loaded");

        Self {
            store,
            key: key.to_string(),
            entries: RwLock::new(entries),
        }
    }

    pub async fn entries(&self) -> Vec<String> {
        self.entries.read().await.clone()
    }

    /// Move `query` to the front, drop duplicates, cap and persist.
    ///
    /// The in-memory list is updated even when persisting fails.
    pub async fn add(&self, query: &str) -> Result<Vec<String>> {
        if query.trim().is_empty() {
            return Ok(self.entries().await);
        }

        // The write guard is held across the store call so persisted
        // snapshots land in the same order as the in-memory updates.
        let mut entries = self.entries.write().await;
        entries.retain(|existing| existing != query);
        entries.insert(0, query.to_string());
        entries.truncate(MAX_HISTORY_ENTRIES);
        let snapshot = entries.clone();

        self.store
            .set(&self.key, serde_json::to_string(&snapshot)?)
            .await?;

        Ok(snapshot)
    }

    pub async fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.clear();
        self.store.remove(&self.key).await
    }
}
