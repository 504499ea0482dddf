// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock cache implementation for testing.
//!
//! This module provides [`MockCache`], a configurable in-memory tier that records
//! all operations and supports failure injection for testing error paths.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{Cache, Error, Result};

/// Recorded cache operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp<V> {
    /// A get was performed with the given key.
    Get(String),
    /// A set was performed with the given key and value.
    Set {
        /// The key that was written.
        key: String,
        /// The value that was written.
        value: V,
    },
}

type FailPredicate<V> = Box<dyn Fn(&CacheOp<V>) -> bool + Send + Sync>;

/// A configurable mock tier for testing.
///
/// Stores values in memory, records every operation for later verification, and
/// can be configured to fail operations on demand.
///
/// # Examples
///
/// ```no_run
/// use strata_tier::testing::{CacheOp, MockCache};
/// use strata_tier::Cache;
///
/// # async fn example() {
/// let cache = MockCache::<i32>::new();
///
/// cache.set("key", 42).await.unwrap();
/// assert_eq!(cache.get("key").await.unwrap(), 42);
///
/// assert_eq!(cache.operations(), vec![
///     CacheOp::Set { key: "key".to_string(), value: 42 },
///     CacheOp::Get("key".to_string()),
/// ]);
/// # }
/// ```
///
/// # Failure Injection
///
/// ```no_run
/// use strata_tier::testing::{CacheOp, MockCache};
/// use strata_tier::Cache;
///
/// # async fn example() {
/// let cache: MockCache<i32> = MockCache::new();
///
/// // Fail only writes of a specific key.
/// cache.fail_when(|op| matches!(op, CacheOp::Set { key, .. } if key == "forbidden"));
/// assert!(cache.set("forbidden", 1).await.is_err());
/// assert!(cache.set("allowed", 1).await.is_ok());
/// # }
/// ```
pub struct MockCache<V> {
    data: Arc<Mutex<HashMap<String, V>>>,
    operations: Arc<Mutex<Vec<CacheOp<V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<V>>>>,
}

impl<V> std::fmt::Debug for MockCache<V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCache")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<V> Clone for MockCache<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<V> Default for MockCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MockCache<V> {
    /// Creates a new empty mock cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Seeds an entry without recording an operation.
    pub fn seed(&self, key: impl Into<String>, value: V) {
        drop(self.data.lock().insert(key.into(), value));
    }

    /// Removes an entry without recording an operation.
    pub fn unseed(&self, key: &str) {
        drop(self.data.lock().remove(key));
    }

    /// Configures a predicate; operations it matches fail with a backend error.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&CacheOp<V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears any configured failure predicate.
    pub fn fail_never(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns `true` if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    fn check(&self, op: &CacheOp<V>) -> Result<()> {
        if let Some(predicate) = self.fail_when.lock().as_ref()
            && predicate(op)
        {
            return Err(Error::backend("injected failure"));
        }
        Ok(())
    }
}

impl<V> MockCache<V>
where
    V: Clone,
{
    /// Returns every recorded operation, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<CacheOp<V>> {
        self.operations.lock().clone()
    }

    /// Returns the number of recorded get operations for `key`.
    #[must_use]
    pub fn gets_for(&self, key: &str) -> usize {
        self.operations
            .lock()
            .iter()
            .filter(|op| matches!(op, CacheOp::Get(k) if k == key))
            .count()
    }
}

#[async_trait]
impl<V> Cache<V> for MockCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V> {
        let op = CacheOp::Get(key.to_string());
        self.operations.lock().push(op.clone());
        self.check(&op)?;
        self.data.lock().get(key).cloned().ok_or(Error::NotFound)
    }

    async fn set(&self, key: &str, value: V) -> Result<()> {
        let op = CacheOp::Set {
            key: key.to_string(),
            value: value.clone(),
        };
        self.operations.lock().push(op.clone());
        self.check(&op)?;
        drop(self.data.lock().insert(key.to_string(), value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_operations_in_order() {
        let cache = MockCache::<i32>::new();
        cache.set("a", 1).await.expect("set failed");
        assert_eq!(cache.get("a").await, Ok(1));
        assert_eq!(cache.get("missing").await, Err(Error::NotFound));

        assert_eq!(
            cache.operations(),
            vec![
                CacheOp::Set {
                    key: "a".to_string(),
                    value: 1
                },
                CacheOp::Get("a".to_string()),
                CacheOp::Get("missing".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn injected_failures_match_the_predicate() {
        let cache = MockCache::<i32>::new();
        cache.seed("present", 5);
        cache.fail_when(|op| matches!(op, CacheOp::Get(k) if k == "present"));

        assert!(matches!(cache.get("present").await, Err(Error::Backend(_))));
        assert_eq!(cache.get("absent").await, Err(Error::NotFound));

        cache.fail_never();
        assert_eq!(cache.get("present").await, Ok(5));
    }
}
