// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-process cache tier with jittered TTL and timing-wheel eviction.
//!
//! This crate provides [`MemoryCache`], a lock-guarded in-memory map paired with
//! a timing wheel that evicts entries at their jittered deadline without keeping
//! one timer per entry. Every write perturbs the nominal TTL by a configurable
//! deviation fraction so that entries written at the same instant do not expire
//! en masse.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use strata_memory::MemoryCache;
//! use strata_tier::{Cache, Error};
//!
//! # async fn example() -> strata_tier::Result<()> {
//! let cache = MemoryCache::<String>::new(Duration::from_secs(60));
//!
//! cache.set("key", "value".to_string()).await?;
//! assert_eq!(cache.get("key").await?, "value");
//!
//! cache.delete("key");
//! assert_eq!(cache.get("key").await, Err(Error::NotFound));
//! # Ok(())
//! # }
//! ```
//!
//! # Eviction
//!
//! Eviction runs on a dedicated task spawned at construction, which advances the
//! wheel on a fixed tick and removes the due bucket's keys under the same lock
//! that guards reads and writes. The task is aborted when the cache is dropped,
//! so the cache owns its full teardown. Construction therefore requires a
//! running tokio runtime.

mod cache;
mod wheel;

#[doc(inline)]
pub use cache::MemoryCache;
