//! Read-through cache for the hot list endpoints.
//!
//! Two keys are cached:
//! - `vaults:user:{user_id}`: the caller's vault list (60s)
//! - `vault:{vault_id}:sources`: a vault's sources (30s)
//!
//! Writes delete the affected keys instead of updating them. Cache failures
//! are logged and treated as misses so Redis being down never fails a request.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::BaseCache;
use crate::common::{UserId, VaultId};

pub const VAULT_LIST_TTL: Duration = Duration::from_secs(60);
pub const SOURCE_LIST_TTL: Duration = Duration::from_secs(30);

pub fn vault_list_key(user_id: UserId) -> String {
    format!("vaults:user:{}", user_id)
}

pub fn source_list_key(vault_id: VaultId) -> String {
    format!("vault:{}:sources", vault_id)
}

/// Return the cached value for `key`, or run `load`, cache and return its result.
pub async fn read_through<T, E, F, Fut>(
    cache: &dyn BaseCache,
    key: &str,
    ttl: Duration,
    load: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                return Ok(value);
            }
            Err(e) => warn!(key, error = %e, "Discarding undecodable cache entry"),
        },
        Ok(None) => debug!(key, "Cache miss"),
        Err(e) => warn!(key, error = %e, "Cache read failed"),
    }

    let value = load().await?;

    match serde_json::to_string(&value) {
        Ok(raw) => {
            if let Err(e) = cache.set(key, &raw, ttl).await {
                warn!(key, error = %e, "Cache write failed");
            }
        }
        Err(e) => warn!(key, error = %e, "Failed to encode cache entry"),
    }

    Ok(value)
}

/// Delete keys, logging instead of failing.
pub async fn invalidate(cache: &dyn BaseCache, keys: Vec<String>) {
    if keys.is_empty() {
        return;
    }
    if let Err(e) = cache.delete(&keys).await {
        warn!(?keys, error = %e, "Cache invalidation failed");
    }
}

// =============================================================================
// Redis
// =============================================================================

/// Redis-backed cache. `ConnectionManager` reconnects on its own and is cheap to clone.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Invalid REDIS_URL")?;
        let connection = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl BaseCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection.clone();
        let _: () = conn.del(keys).await?;
        Ok(())
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Process-local cache used in tests and when Redis is unavailable.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }
}

#[async_trait]
impl BaseCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    /// Expired entries are dropped on every write
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_read_through_loads_once() {
        let cache = MemoryCache::new();
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> =
                read_through::<_, anyhow::Error, _, _>(&cache, "k", VAULT_LIST_TTL, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["thesis".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["thesis".to_string()]);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_set_prunes_expired_entries() {
        let cache = MemoryCache::new();
        for i in 0..10 {
            cache
                .set(&format!("stale:{}", i), "x", Duration::from_millis(1))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.entries.read().await.len(), 10);

        cache.set("fresh", "y", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.entries.read().await.len(), 1);
        assert_eq!(cache.get("fresh").await.unwrap().as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let cache = MemoryCache::new();
        let key = source_list_key(VaultId::new());

        let _: u32 = read_through::<_, anyhow::Error, _, _>(&cache, &key, SOURCE_LIST_TTL, || async {
            Ok(1)
        })
        .await
        .unwrap();

        invalidate(&cache, vec![key.clone()]).await;

        let reloaded: u32 =
            read_through::<_, anyhow::Error, _, _>(&cache, &key, SOURCE_LIST_TTL, || async { Ok(2) })
                .await
                .unwrap();
        assert_eq!(reloaded, 2);
    }

    #[tokio::test]
    async fn test_load_errors_are_not_cached() {
        let cache = MemoryCache::new();

        let result: Result<u32, &str> =
            read_through(&cache, "k", VAULT_LIST_TTL, || async { Err("db down") }).await;
        assert_eq!(result, Err("db down"));
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_memory_cache_expires_entries() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::from_millis(10)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[test]
    fn test_cache_keys() {
        let user_id = UserId::new();
        assert_eq!(vault_list_key(user_id), format!("vaults:user:{}", user_id));
    }
}
