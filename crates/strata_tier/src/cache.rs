// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core capability for cache tiers and store adapters.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{Error, Result};

/// Minimal contract satisfied by every cache tier.
///
/// A tier stores opaque values of type `V` under string keys. [`get`](Cache::get)
/// on an absent key returns [`Error::NotFound`]; any other error is a genuine
/// backend failure and is propagated verbatim by the composition layer.
///
/// The trait is object safe, so heterogeneous tiers can be composed as
/// `Arc<dyn Cache<V>>`. Cancellation is carried by dropping the returned future;
/// there is no explicit context argument.
#[async_trait]
pub trait Cache<V>: Send + Sync
where
    V: Send + Sync + 'static,
{
    /// Retrieves the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] on a miss, or another [`Error`] if the tier's
    /// backing store failed.
    async fn get(&self, key: &str) -> Result<V>;

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the tier's backing store failed.
    async fn set(&self, key: &str, value: V) -> Result<()>;
}

#[async_trait]
impl<V, C> Cache<V> for Arc<C>
where
    V: Send + Sync + 'static,
    C: Cache<V> + ?Sized,
{
    async fn get(&self, key: &str) -> Result<V> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        (**self).set(key, value).await
    }
}

#[async_trait]
impl<'a, V, C> Cache<V> for &'a C
where
    C: 'a,
    V: Send + Sync + 'static,
    C: Cache<V> + ?Sized,
{
    async fn get(&self, key: &str) -> Result<V> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        (**self).set(key, value).await
    }
}
