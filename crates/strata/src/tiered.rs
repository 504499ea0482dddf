// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The common two-tier arrangement: local memory in front of a remote tier.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use strata_memory::MemoryCache;
use strata_tier::{Cache, CacheConfig, CacheKey, Result};
use tokio_util::sync::CancellationToken;

use crate::{chain::ChainCache, loadable::LoadableCache};

/// A loadable two-tier cache: an in-process tier in front of a remote one.
///
/// The local [`MemoryCache`] holds entries for a quarter of `ttl`, so a value
/// is re-fetched from the remote tier a few times before the remote entry
/// itself lapses and the loader runs again. Reads check the local tier first
/// and backfill it on a remote hit; writes go to the remote tier first and
/// fail fast, leaving the local tier untouched when the remote write fails.
///
/// The remote tier owns its own expiry; `ttl` only governs the local tier.
///
/// # Panics
///
/// Construction spawns the local tier's eviction task and panics when called
/// outside a tokio runtime.
pub struct TieredCache<V> {
    inner: LoadableCache<V>,
}

impl<V> fmt::Debug for TieredCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCache").finish_non_exhaustive()
    }
}

impl<V> TieredCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a tiered cache over `remote` with the default configuration.
    #[must_use]
    pub fn new(remote: impl Cache<V> + 'static, ttl: Duration) -> Self {
        Self::with_config(remote, ttl, CacheConfig::default())
    }

    /// Creates a tiered cache with explicit configuration for the local tier.
    #[must_use]
    pub fn with_config(remote: impl Cache<V> + 'static, ttl: Duration, config: CacheConfig) -> Self {
        let local = MemoryCache::with_config(ttl / 4, config);
        let chain = ChainCache::new(vec![Arc::new(local), Arc::new(remote)]);
        Self {
            inner: LoadableCache::new(chain),
        }
    }

    /// Returns the cached value for `key`, running `loader` on a miss in both
    /// tiers. See [`LoadableCache::load`].
    ///
    /// # Errors
    ///
    /// Propagates the loader's failure as [`Error::Backend`](strata_tier::Error::Backend).
    pub async fn load<K, E, F, Fut>(&self, key: &K, loader: F) -> Result<V>
    where
        K: CacheKey + ?Sized,
        E: fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        self.inner.load(key, loader).await
    }

    /// [`load`](Self::load) with a cancellation token handed to the loader.
    pub async fn load_cancellable<K, E, F, Fut>(
        &self,
        key: &K,
        token: CancellationToken,
        loader: F,
    ) -> Result<V>
    where
        K: CacheKey + ?Sized,
        E: fmt::Display,
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        self.inner.load_cancellable(key, token, loader).await
    }
}

#[async_trait]
impl<V> Cache<V> for TieredCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        self.inner.set(key, value).await
    }
}
