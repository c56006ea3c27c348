// TestDependencies - in-memory implementations for testing
//
// Provides fakes that can be injected into ServerDeps for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use sqlx::PgPool;

use super::{BaseFileStore, MemoryCache, ServerDeps, StreamHub};
use crate::domains::auth::JwtService;

// =============================================================================
// Memory File Store
// =============================================================================

#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, Bytes>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a file is currently stored under `path`
    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl BaseFileStore for MemoryFileStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<String> {
        self.files.lock().unwrap().insert(key.to_string(), data);
        Ok(key.to_string())
    }

    async fn get(&self, path: &str) -> Result<Bytes> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("No stored file at {}", path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.files.lock().unwrap().remove(path);
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

pub const TEST_JWT_SECRET: &str = "test_secret_key";
pub const TEST_JWT_ISSUER: &str = "test_issuer";

pub struct TestDependencies {
    pub cache: Arc<MemoryCache>,
    pub file_store: Arc<MemoryFileStore>,
    pub stream_hub: StreamHub,
    pub jwt_service: Arc<JwtService>,
    pub max_upload_bytes: usize,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(MemoryCache::new()),
            file_store: Arc::new(MemoryFileStore::new()),
            stream_hub: StreamHub::new(),
            jwt_service: Arc::new(JwtService::new(
                TEST_JWT_SECRET,
                TEST_JWT_ISSUER.to_string(),
            )),
            max_upload_bytes: 1024 * 1024,
        }
    }

    /// Override the upload limit
    pub fn max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    /// Convert into ServerDeps for testing
    pub fn into_deps(self, db_pool: PgPool) -> ServerDeps {
        ServerDeps::new(
            db_pool,
            self.cache,
            self.file_store,
            self.jwt_service,
            self.stream_hub,
            self.max_upload_bytes,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_file_store() {
        let store = MemoryFileStore::new();
        store.put("a/b", Bytes::from_static(b"notes")).await.unwrap();
        assert!(store.contains("a/b"));
        assert_eq!(store.get("a/b").await.unwrap(), Bytes::from_static(b"notes"));

        store.delete("a/b").await.unwrap();
        assert_eq!(store.len(), 0);
        assert!(store.get("a/b").await.is_err());
    }
}
