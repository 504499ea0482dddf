// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Collapses duplicate concurrent async computations into a single per-key execution.
//!
//! This crate provides [`Group`], a mechanism for deduplicating concurrent async
//! operations. When multiple tasks request the same work (identified by a key), only
//! the first task (the "executor") performs the actual work while subsequent tasks
//! (the "followers") wait and receive a clone of the executor's outcome.
//!
//! # When to Use
//!
//! Use a `Group` when you have expensive or rate-limited operations that may be
//! requested concurrently with the same parameters:
//!
//! - **Cache population**: prevent a thundering herd when a cache entry expires
//! - **API calls**: deduplicate concurrent requests to the same endpoint
//! - **Database queries**: coalesce identical queries issued simultaneously
//!
//! # Example
//!
//! ```
//! use monoflight::Group;
//!
//! # async fn example() {
//! let group: Group<&str, String> = Group::new();
//!
//! // Concurrent calls with the same key share a single execution.
//! let result = group.work("user:123", || async {
//!     // This expensive operation runs once per wave of overlapping callers.
//!     "expensive_result".to_string()
//! }).await;
//! # }
//! ```
//!
//! # Waves
//!
//! All callers whose calls overlap in time form one "wave": exactly one of them
//! executes, and every member of the wave receives that execution's outcome. A call
//! arriving after the wave's record has been removed starts a new wave.
//!
//! # Panic and Cancellation Safety
//!
//! If the executor's closure panics, the panic is caught at the execution boundary
//! and every member of the wave receives [`Aborted::Panicked`] carrying the panic
//! message. If the executor's future is dropped mid-flight, the wave's record is
//! torn down and followers receive [`Aborted::Dropped`] rather than waiting forever.
//!
//! A follower cannot detach itself from a wave by signalling cancellation: only the
//! closure run by the executor may observe a cancellation token (see
//! [`Group::work_cancellable`]). This is a deliberate part of the contract.

use std::{collections::HashMap, fmt, hash::Hash, panic::AssertUnwindSafe};

use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Error shared with every member of a wave whose execution terminated abnormally.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Aborted {
    /// The executor's closure panicked; the payload is the panic message.
    #[error("computation panicked: {0}")]
    Panicked(String),

    /// The executor's future was dropped before the computation completed.
    #[error("computation was dropped before completing")]
    Dropped,
}

/// Reports whether a caller's result came from its own execution or a shared one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// This caller executed the computation itself.
    Fresh,
    /// This caller received the outcome of another caller's execution.
    Shared,
}

impl Freshness {
    /// Returns `true` for the one caller per wave that actually executed.
    #[must_use]
    pub fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// Completion slot observed by every follower of a wave.
type Slot<V> = Option<Result<V, Aborted>>;

type Registry<K, V> = Mutex<HashMap<K, watch::Receiver<Slot<V>>>>;

/// Represents a class of work and creates a space in which units of work can be
/// executed with duplicate suppression.
///
/// At most one record per key exists at any instant; the record is removed as soon
/// as the owning execution completes, so temporally disjoint calls each execute.
///
/// # Example
///
/// ```
/// use monoflight::{Freshness, Group};
///
/// # async fn example() {
/// let group: Group<String, u64> = Group::new();
/// let (result, freshness) = group
///     .work_detailed("answer".to_string(), || async { 42 })
///     .await;
/// assert_eq!(result, Ok(42));
/// assert_eq!(freshness, Freshness::Fresh);
/// # }
/// ```
pub struct Group<K, V> {
    calls: Registry<K, V>,
}

impl<K, V> Default for Group<K, V> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> fmt::Debug for Group<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group").finish_non_exhaustive()
    }
}

/// Role a caller assumes after consulting the registry.
enum Role<K, V> {
    Executor(watch::Sender<Slot<V>>, K),
    Follower(watch::Receiver<Slot<V>>),
}

/// Removes a wave's registry entry when the execution finishes or is dropped.
struct FlightGuard<'a, K, V>
where
    K: Hash + Eq,
{
    calls: &'a Registry<K, V>,
    key: Option<K>,
}

impl<K, V> FlightGuard<'_, K, V>
where
    K: Hash + Eq,
{
    fn remove(&mut self) {
        if let Some(key) = self.key.take() {
            drop(self.calls.lock().remove(&key));
        }
    }

    fn finish(mut self) {
        self.remove();
    }
}

impl<K, V> Drop for FlightGuard<'_, K, V>
where
    K: Hash + Eq,
{
    fn drop(&mut self) {
        self.remove();
    }
}

impl<K, V> Group<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a new, empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes `func` deduplicated by `key`.
    ///
    /// If no execution is outstanding for `key`, this caller becomes the executor
    /// and runs `func` to completion; otherwise it suspends until the outstanding
    /// execution completes and returns a clone of its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Aborted::Panicked`] if the execution panicked, or
    /// [`Aborted::Dropped`] if the executor's future was dropped mid-flight.
    pub async fn work<F, Fut>(&self, key: K, func: F) -> Result<V, Aborted>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        self.work_detailed(key, func).await.0
    }

    /// Like [`work`](Self::work), also reporting whether this caller executed.
    ///
    /// Exactly one caller per wave observes [`Freshness::Fresh`]; every follower
    /// observes [`Freshness::Shared`], even when the shared outcome is an error.
    pub async fn work_detailed<F, Fut>(&self, key: K, func: F) -> (Result<V, Aborted>, Freshness)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let role = {
            let mut calls = self.calls.lock();
            if let Some(rx) = calls.get(&key) {
                Role::Follower(rx.clone())
            } else {
                let (tx, rx) = watch::channel(None);
                calls.insert(key.clone(), rx);
                Role::Executor(tx, key)
            }
        };

        match role {
            Role::Executor(tx, key) => {
                let guard = FlightGuard {
                    calls: &self.calls,
                    key: Some(key),
                };
                // Run outside the registry lock so unrelated keys never serialize
                // behind this execution.
                let outcome = match AssertUnwindSafe(func()).catch_unwind().await {
                    Ok(value) => Ok(value),
                    Err(payload) => Err(Aborted::Panicked(panic_message(payload.as_ref()))),
                };
                // Remove the record first so the next wave can start, then release
                // the followers of this wave.
                guard.finish();
                drop(tx.send(Some(outcome.clone())));
                (outcome, Freshness::Fresh)
            }
            Role::Follower(mut rx) => {
                let outcome = match rx.wait_for(|slot| slot.is_some()).await {
                    Ok(slot) => slot.clone().unwrap_or(Err(Aborted::Dropped)),
                    // Sender dropped without a value: the executor was cancelled.
                    Err(_) => Err(Aborted::Dropped),
                };
                (outcome, Freshness::Shared)
            }
        }
    }

    /// [`work`](Self::work) with a cancellation token handed to the computation.
    ///
    /// The token is passed to `func` so the execution itself may observe it. A
    /// follower's own token is *not* observed: followers wait for the shared
    /// outcome regardless of cancellation.
    pub async fn work_cancellable<F, Fut>(&self, key: K, token: CancellationToken, func: F) -> Result<V, Aborted>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = V>,
    {
        self.work(key, move || func(token)).await
    }

    /// [`work_detailed`](Self::work_detailed) with a cancellation token handed to
    /// the computation. See [`work_cancellable`](Self::work_cancellable).
    pub async fn work_cancellable_detailed<F, Fut>(
        &self,
        key: K,
        token: CancellationToken,
        func: F,
    ) -> (Result<V, Aborted>, Freshness)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = V>,
    {
        self.work_detailed(key, move || func(token)).await
    }

    /// Returns the number of outstanding executions.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

/// Extracts a human-readable message from a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_handles_str_and_string() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new("boom".to_string());
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(17_i32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }

    #[test]
    fn freshness_predicate() {
        assert!(Freshness::Fresh.is_fresh());
        assert!(!Freshness::Shared.is_fresh());
    }

    #[test]
    fn aborted_display() {
        assert_eq!(Aborted::Panicked("oops".into()).to_string(), "computation panicked: oops");
        assert_eq!(Aborted::Dropped.to_string(), "computation was dropped before completing");
    }
}
