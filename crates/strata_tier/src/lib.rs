// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Core cache tier abstractions for building cache backends.
//!
//! This crate defines the [`Cache`] capability that every tier and every external
//! store adapter must satisfy, along with the shared [`Error`] taxonomy, the
//! [`CacheKey`] derivation rules, and per-instance [`CacheConfig`] tunables.
//!
//! # Overview
//!
//! The capability is deliberately minimal: get and set by string key, with a
//! distinguished [`Error::NotFound`] outcome for a miss. Implement [`Cache`] for a
//! storage backend, then use `strata` to compose tiers, add stampede protection,
//! and tie in a load function.
//!
//! # Implementing a Tier
//!
//! ```
//! use async_trait::async_trait;
//! use parking_lot::Mutex;
//! use std::collections::HashMap;
//! use strata_tier::{Cache, Error, Result};
//!
//! struct SimpleCache<V>(Mutex<HashMap<String, V>>);
//!
//! #[async_trait]
//! impl<V> Cache<V> for SimpleCache<V>
//! where
//!     V: Clone + Send + Sync + 'static,
//! {
//!     async fn get(&self, key: &str) -> Result<V> {
//!         self.0.lock().get(key).cloned().ok_or(Error::NotFound)
//!     }
//!
//!     async fn set(&self, key: &str, value: V) -> Result<()> {
//!         self.0.lock().insert(key.to_string(), value);
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # External Store Adapters
//!
//! A remote key-value adapter participates by implementing [`Cache`] as well: it
//! must translate its store's "key absent" signal into [`Error::NotFound`], honor
//! [`CacheConfig::key_prefix`] via [`CacheConfig::prefixed`], and apply the same
//! jitter policy as the local tier via [`CacheConfig::jittered_ttl`].

mod cache;
pub mod config;
pub mod error;
pub mod key;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use cache::Cache;
#[doc(inline)]
pub use config::CacheConfig;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use key::{CacheKey, digest_key};
