// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Naming convention: Base* for trait names (e.g., BaseCache, BaseFileStore)

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

// =============================================================================
// Cache Trait (Infrastructure - key/value with TTL)
// =============================================================================

#[async_trait]
pub trait BaseCache: Send + Sync {
    /// Fetch a cached value, `None` on miss
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that expires after `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove keys (missing keys are ignored)
    async fn delete(&self, keys: &[String]) -> Result<()>;
}

// =============================================================================
// File Store Trait (Infrastructure - uploaded source files)
// =============================================================================

#[async_trait]
pub trait BaseFileStore: Send + Sync {
    /// Persist bytes under a relative key, returning the stored path
    async fn put(&self, key: &str, data: Bytes) -> Result<String>;

    /// Read a previously stored file
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// Remove a stored file (missing files are ignored)
    async fn delete(&self, path: &str) -> Result<()>;
}
