// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Composable multi-tier caching with single-flight loading.
//!
//! This crate assembles the building blocks of the workspace into three
//! ready-to-use layers:
//!
//! - [`ChainCache`] reads through an ordered list of tiers and backfills the
//!   faster tiers on a hit further down the chain.
//! - [`LoadableCache`] wraps any tier in the cache-aside pattern: a miss runs a
//!   caller-supplied loader exactly once per key, no matter how many callers
//!   race on it.
//! - [`TieredCache`] is the common two-tier arrangement, an in-process
//!   [`MemoryCache`] in front of a remote tier, already chained and loadable.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use strata::{Cache, MemoryCache, LoadableCache};
//!
//! # async fn example() -> strata::Result<()> {
//! let cache = LoadableCache::new(MemoryCache::<String>::new(Duration::from_secs(60)));
//!
//! let value = cache
//!     .load("user:7", || async { fetch_user(7).await })
//!     .await?;
//! # Ok(())
//! # }
//! # async fn fetch_user(_id: u64) -> Result<String, std::io::Error> { Ok(String::new()) }
//! ```
//!
//! # Keys
//!
//! Every layer addresses entries by string keys. Loaders accept anything that
//! implements [`CacheKey`]: strings pass through unchanged, and other types
//! either describe their own key or delegate to [`digest_key`].

mod chain;
mod loadable;
mod tiered;

#[doc(inline)]
pub use chain::ChainCache;
#[doc(inline)]
pub use loadable::LoadableCache;
#[doc(inline)]
pub use monoflight::Group;
#[doc(inline)]
pub use strata_memory::MemoryCache;
#[doc(inline)]
pub use strata_tier::{Cache, CacheConfig, CacheKey, Error, Result, digest_key};
#[doc(inline)]
pub use tiered::TieredCache;

#[cfg(feature = "test-util")]
#[doc(inline)]
pub use strata_tier::testing::{CacheOp, MockCache};
