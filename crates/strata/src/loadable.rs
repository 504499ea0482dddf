// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache-aside loading with per-key stampede protection.

use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use monoflight::Group;
use strata_tier::{Cache, CacheKey, Error, Result};
use tokio_util::sync::CancellationToken;

/// A cache tier paired with a loader run on misses.
///
/// [`load`](LoadableCache::load) is the cache-aside pattern in one call: read
/// the cache, and on a miss run the supplied loader and write its value back.
/// Concurrent loads of one key are collapsed by a single-flight group so the
/// loader runs once per key per wave; every other caller waits and shares the
/// executor's outcome, including its error.
///
/// The write-back is best-effort. A failed write is logged and the loaded
/// value is still returned, so a flaky tier degrades to loading every time
/// rather than failing reads.
///
/// A read error other than [`Error::NotFound`] on the way in is treated as a
/// miss: the loader is the better source of truth when the cache is unhealthy.
pub struct LoadableCache<V> {
    cache: Arc<dyn Cache<V>>,
    flight: Group<String, Result<V>>,
}

impl<V> fmt::Debug for LoadableCache<V>
where
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadableCache")
            .field("loads_in_flight", &self.flight.in_flight())
            .finish_non_exhaustive()
    }
}

impl<V> LoadableCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Wraps `cache` in cache-aside loading.
    #[must_use]
    pub fn new(cache: impl Cache<V> + 'static) -> Self {
        Self {
            cache: Arc::new(cache),
            flight: Group::new(),
        }
    }

    /// Returns the wrapped cache tier.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn Cache<V>> {
        &self.cache
    }

    /// Returns the cached value for `key`, running `loader` on a miss.
    ///
    /// The loader's value is written back to the cache before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] when the loader fails, and
    /// [`Error::Aborted`] when the caller that ran the loader panicked or was
    /// dropped mid-flight.
    pub async fn load<K, E, F, Fut>(&self, key: &K, loader: F) -> Result<V>
    where
        K: CacheKey + ?Sized,
        E: fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let key = key.cache_key();
        if let Some(value) = self.try_get(&key).await {
            return Ok(value);
        }

        let cache = &self.cache;
        let outcome = self
            .flight
            .work(key.clone(), || async move {
                // A previous wave may have filled the cache while this caller
                // was waiting for the registry.
                match cache.get(&key).await {
                    Ok(value) => return Ok(value),
                    Err(err) if !err.is_not_found() => {
                        tracing::debug!(key = %key, error = %err, "cache read failed, loading instead");
                    }
                    Err(_) => {}
                }

                let value = loader().await.map_err(Error::backend)?;
                if let Err(err) = cache.set(&key, value.clone()).await {
                    tracing::debug!(key = %key, error = %err, "cache write-back failed");
                }
                Ok(value)
            })
            .await;

        match outcome {
            Ok(result) => result,
            Err(aborted) => Err(Error::aborted(aborted)),
        }
    }

    /// [`load`](Self::load) with a cancellation token handed to the loader.
    ///
    /// Only the caller that actually runs the loader hands its token over;
    /// followers share the executor's outcome and their tokens are not
    /// observed.
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
        let key = key.cache_key();
        if let Some(value) = self.try_get(&key).await {
            return Ok(value);
        }

        let cache = &self.cache;
        let outcome = self
            .flight
            .work_cancellable(key.clone(), token, |token| async move {
                match cache.get(&key).await {
                    Ok(value) => return Ok(value),
                    Err(err) if !err.is_not_found() => {
                        tracing::debug!(key = %key, error = %err, "cache read failed, loading instead");
                    }
                    Err(_) => {}
                }

                let value = loader(token).await.map_err(Error::backend)?;
                if let Err(err) = cache.set(&key, value.clone()).await {
                    tracing::debug!(key = %key, error = %err, "cache write-back failed");
                }
                Ok(value)
            })
            .await;

        match outcome {
            Ok(result) => result,
            Err(aborted) => Err(Error::aborted(aborted)),
        }
    }

    /// The initial optimistic read; any error counts as a miss.
    async fn try_get(&self, key: &str) -> Option<V> {
        match self.cache.get(key).await {
            Ok(value) => Some(value),
            Err(err) => {
                if !err.is_not_found() {
                    tracing::debug!(key, error = %err, "cache read failed, treating as a miss");
                }
                None
            }
        }
    }
}

#[async_trait]
impl<V> Cache<V> for LoadableCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        self.cache.get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        self.cache.set(key, value).await
    }
}
