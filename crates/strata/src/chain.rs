// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Read-through chaining over an ordered list of cache tiers.

use std::sync::Arc;

use async_trait::async_trait;
use monoflight::Group;
use strata_tier::{Cache, Error, Result};

/// An ordered chain of cache tiers, fastest first.
///
/// A read consults the tiers in order and returns the first hit, writing the
/// value back into every faster tier on the way out so the next read is served
/// higher up. Concurrent reads of one key are collapsed into a single traversal
/// by an internal single-flight group, so a slow lower tier is hit once per
/// key no matter how many callers race.
///
/// A write stores into every tier, slowest first, and fails fast: when a tier
/// rejects the write, faster tiers are left untouched so they cannot serve a
/// value the tiers below never accepted.
///
/// Backfill writes are best-effort. A tier that fails one keeps its stale or
/// missing entry and the hit is still returned to the caller.
pub struct ChainCache<V> {
    tiers: Vec<Arc<dyn Cache<V>>>,
    flight: Group<String, Result<V>>,
}

impl<V> std::fmt::Debug for ChainCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainCache")
            .field("tiers", &self.tiers.len())
            .finish_non_exhaustive()
    }
}

impl<V> ChainCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a chain over `tiers`, ordered fastest first.
    ///
    /// # Panics
    ///
    /// Panics if `tiers` is empty.
    #[must_use]
    pub fn new(tiers: Vec<Arc<dyn Cache<V>>>) -> Self {
        assert!(!tiers.is_empty(), "a cache chain needs at least one tier");
        Self {
            tiers,
            flight: Group::new(),
        }
    }

    /// Returns the number of tiers in the chain.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tiers.len()
    }

    /// Walks the tiers in order, backfilling the faster ones on a hit.
    async fn lookup(&self, key: &str) -> Result<V> {
        for (depth, tier) in self.tiers.iter().enumerate() {
            match tier.get(key).await {
                Ok(value) => {
                    self.backfill(key, &value, depth).await;
                    return Ok(value);
                }
                Err(Error::NotFound) => {}
                Err(err) => return Err(err),
            }
        }
        Err(Error::NotFound)
    }

    /// Writes `value` into every tier above `depth`, nearest the hit first.
    async fn backfill(&self, key: &str, value: &V, depth: usize) {
        for (index, tier) in self.tiers[..depth].iter().enumerate().rev() {
            if let Err(err) = tier.set(key, value.clone()).await {
                tracing::debug!(key, tier = index, error = %err, "cache backfill failed");
            }
        }
    }
}

#[async_trait]
impl<V> Cache<V> for ChainCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        match self.flight.work(key.to_string(), || self.lookup(key)).await {
            Ok(result) => result,
            Err(aborted) => Err(Error::aborted(aborted)),
        }
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        for tier in self.tiers.iter().rev() {
            tier.set(key, value.clone()).await?;
        }
        Ok(())
    }
}
