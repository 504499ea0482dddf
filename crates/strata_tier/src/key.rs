// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Derivation of stable string cache keys from typed arguments.
//!
//! The rules, in priority order:
//!
//! 1. A string argument is its own key (the provided `str`/`String` impls).
//! 2. A type with a natural key implements [`CacheKey`] itself (the
//!    "self-describing key" capability).
//! 3. Anything else delegates its [`CacheKey`] impl to [`digest_key`], which
//!    hashes the argument's type identity and canonical rendering.

use std::fmt;

use sha2::{Digest, Sha256};

/// Capability of producing a stable string cache key for a value.
///
/// Keys must be deterministic for logically equal values within one process.
/// Stability across process restarts or crate versions is *not* part of the
/// contract and must not be relied upon by callers.
///
/// # Examples
///
/// ```
/// use strata_tier::{CacheKey, digest_key};
///
/// // Rule 1: strings pass through unchanged.
/// assert_eq!("user:7".cache_key(), "user:7");
///
/// // Rule 2: a self-describing key.
/// struct UserId(u64);
/// impl CacheKey for UserId {
///     fn cache_key(&self) -> String {
///         format!("user:{}", self.0)
///     }
/// }
/// assert_eq!(UserId(7).cache_key(), "user:7");
///
/// // Rule 3: fall back to a content digest.
/// #[derive(Debug)]
/// struct Query { page: u32, term: String }
/// impl CacheKey for Query {
///     fn cache_key(&self) -> String {
///         digest_key(self)
///     }
/// }
/// ```
pub trait CacheKey {
    /// Produces the cache key for this value.
    fn cache_key(&self) -> String;
}

impl CacheKey for str {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl CacheKey for String {
    fn cache_key(&self) -> String {
        self.clone()
    }
}

impl<K> CacheKey for &K
where
    K: CacheKey + ?Sized,
{
    fn cache_key(&self) -> String {
        (**self).cache_key()
    }
}

macro_rules! integer_cache_key {
    ($($ty:ty),*) => {
        $(
            impl CacheKey for $ty {
                fn cache_key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_cache_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

/// Computes a content-digest key for an arbitrary value.
///
/// The digest covers the value's dynamic type identity and its `Debug`
/// rendering, hashed with SHA-256 and hex encoded. This is deterministic for
/// equal values within one process as long as the `Debug` impl renders fields
/// in a stable order (derived impls do).
///
/// Two distinct values of the same type that render identically collide; this
/// is an accepted approximation, not a correctness guarantee. The digest is
/// also not stable across compiler or crate versions.
pub fn digest_key<T>(value: &T) -> String
where
    T: fmt::Debug + ?Sized,
{
    let mut hasher = Sha256::new();
    hasher.update(std::any::type_name::<T>().as_bytes());
    hasher.update(format!("{value:?}").as_bytes());
    hex::encode(hasher.finalize())
}
