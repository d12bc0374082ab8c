//! Generation-tagged memoization of expensive computations.
//!
//! Every stored value carries the generation that was current when it was
//! computed. Any mutation of the folder hierarchy or an ACL bumps the
//! generation, so every older entry reads as a miss from then on and the
//! provider never needs pattern deletion.
//!
//! The generation counter lives in this process. Several processes sharing
//! one Redis cache only see each other's writes once the TTL elapses.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use canopy_core::config::cache::CacheConfig;
use canopy_core::result::AppResult;
use canopy_core::traits::cache::CacheProvider;

use crate::keys;

#[derive(Serialize)]
struct StoredRef<'a, T> {
    generation: u64,
    value: &'a T,
}

#[derive(Deserialize)]
struct Stored<T> {
    generation: u64,
    value: T,
}

/// Memoizes query results in a [`CacheProvider`].
#[derive(Debug, Clone)]
pub struct ResultCache {
    provider: Arc<dyn CacheProvider>,
    generation: Arc<AtomicU64>,
    enabled: bool,
    ttl: Duration,
}

impl ResultCache {
    /// Create a result cache on top of `provider`.
    pub fn new(provider: Arc<dyn CacheProvider>, config: &CacheConfig) -> Self {
        Self {
            provider,
            generation: Arc::new(AtomicU64::new(0)),
            enabled: config.enabled,
            ttl: config.timeout(),
        }
    }

    /// Whether memoization is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The generation new entries are tagged with.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Invalidate every entry stored so far.
    pub fn bump_generation(&self) -> u64 {
        let next = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(generation = next, "Result cache generation bumped");
        next
    }

    /// Whether the backing provider is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.provider.health_check().await
    }

    /// Return the cached result for `(query, args)` or compute and store it.
    ///
    /// Cache failures never fail the call: a read error counts as a miss and
    /// a write error is logged and dropped. Errors from `compute` are
    /// returned and not cached.
    pub async fn memoize<T, A, F, Fut>(&self, query: &str, args: &A, compute: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned + Send,
        A: Serialize + Sync + ?Sized,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send,
    {
        if !self.enabled {
            return compute().await;
        }

        let key = keys::memo_key(query, args)?;
        let generation = self.current_generation();

        if let Some(value) = self.lookup::<T>(&key, generation).await {
            return Ok(value);
        }

        let value = compute().await?;

        // A bump while computing means the value may already be stale.
        if self.current_generation() == generation {
            self.store(&key, generation, &value).await;
        }
        Ok(value)
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str, generation: u64) -> Option<T> {
        let raw = match self.provider.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Result cache read failed");
                return None;
            }
        };
        match serde_json::from_str::<Stored<T>>(&raw) {
            Ok(stored) if stored.generation == generation => Some(stored.value),
            Ok(_) => None,
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &str, generation: u64, value: &T) {
        let encoded = match serde_json::to_string(&StoredRef { generation, value }) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key, error = %e, "Result not cacheable");
                return;
            }
        };
        if let Err(e) = self.provider.set(key, &encoded, self.ttl).await {
            warn!(key, error = %e, "Result cache write failed");
        }
    }
}
