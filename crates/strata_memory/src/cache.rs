// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The in-process timed cache tier.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use strata_tier::{Cache, CacheConfig, Error, Result};
use tokio::time::MissedTickBehavior;

use crate::wheel::TimingWheel;

/// Number of buckets in the eviction wheel. With a tick of TTL/16 the wheel
/// spans roughly twice the nominal TTL, comfortably past any jittered deadline.
const WHEEL_BUCKETS: usize = 32;

/// Map plus wheel, guarded by one lock for all reads, writes, and evictions.
struct State<V> {
    data: HashMap<String, V>,
    wheel: TimingWheel,
}

struct Shared<V> {
    state: Mutex<State<V>>,
    ttl: Duration,
    config: CacheConfig,
}

/// Aborts the sweeper task when the cache is dropped.
struct Sweeper(tokio::task::JoinHandle<()>);

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// An in-process cache tier with per-write jittered TTL.
///
/// All map operations are O(1) under a single briefly-held lock. Expiry is
/// handled by a timing wheel advanced by a background task; an entry becomes
/// unreadable at most one wheel tick (TTL/16) after its jittered deadline.
/// Re-writing a live key refreshes its deadline.
///
/// The type is not `Clone`; share it by wrapping it in an [`Arc`], which also
/// implements [`Cache`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use strata_memory::MemoryCache;
/// use strata_tier::{Cache, CacheConfig};
///
/// # async fn example() -> strata_tier::Result<()> {
/// let cache = MemoryCache::with_config(
///     Duration::from_secs(60),
///     CacheConfig::new().with_expiry_deviation(0.1),
/// );
/// cache.set("session", 42_u64).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Panics
///
/// Construction spawns the eviction sweeper and panics when called outside a
/// tokio runtime.
pub struct MemoryCache<V> {
    shared: Arc<Shared<V>>,
    _sweeper: Sweeper,
}

impl<V> std::fmt::Debug for MemoryCache<V>
where
    V: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("ttl", &self.shared.ttl)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<V> MemoryCache<V>
where
    V: Send + Sync + 'static,
{
    /// Creates a cache whose entries live for roughly `ttl`, with the default
    /// expiry deviation.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_config(ttl, CacheConfig::default())
    }

    /// Creates a cache with explicit configuration.
    ///
    /// Only the expiry deviation is consumed here; the key prefix is a
    /// remote-adapter concern and in-process keys stay unprefixed.
    #[must_use]
    pub fn with_config(ttl: Duration, config: CacheConfig) -> Self {
        let tick = (ttl / 16).max(Duration::from_millis(1));
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                data: HashMap::new(),
                wheel: TimingWheel::new(tick, WHEEL_BUCKETS),
            }),
            ttl,
            config,
        });
        let sweeper = Self::spawn_sweeper(&shared, tick);
        Self {
            shared,
            _sweeper: sweeper,
        }
    }

    /// Removes `key` from the map and cancels its pending eviction.
    pub fn delete(&self, key: &str) {
        let mut state = self.shared.state.lock();
        drop(state.data.remove(key));
        state.wheel.cancel(key);
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.lock().data.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().data.is_empty()
    }

    /// Returns the nominal (unjittered) TTL.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.shared.ttl
    }

    fn spawn_sweeper(shared: &Arc<Shared<V>>, tick: Duration) -> Sweeper {
        let weak = Arc::downgrade(shared);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval's first tick completes immediately; skip it so the
            // wheel advances once per elapsed tick.
            let _first = ticker.tick().await;
            loop {
                let _instant = ticker.tick().await;
                let Some(shared) = weak.upgrade() else { break };
                let evicted = {
                    let mut state = shared.state.lock();
                    let due = state.wheel.advance();
                    for key in &due {
                        drop(state.data.remove(key));
                    }
                    due.len()
                };
                if evicted > 0 {
                    tracing::trace!(evicted, "evicted expired cache entries");
                }
            }
        });
        Sweeper(handle)
    }
}

#[async_trait]
impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        self.shared.state.lock().data.get(key).cloned().ok_or(Error::NotFound)
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        // Jitter is computed per write; a re-set refreshes the deadline by
        // moving the key's wheel slot.
        let delay = self.shared.config.jittered_ttl(self.shared.ttl);
        let mut state = self.shared.state.lock();
        drop(state.data.insert(key.to_string(), value));
        state.wheel.schedule(key, delay);
        Ok(())
    }
}
