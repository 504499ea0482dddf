// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A fixed-bucket timing wheel for amortized O(1) eviction scheduling.

use std::{
    collections::{HashMap, HashSet},
    mem,
    time::Duration,
};

/// Schedules string keys for eviction in a ring of time buckets.
///
/// The wheel never sleeps on its own; the owner advances it once per tick and
/// evicts whatever [`advance`](TimingWheel::advance) returns. Scheduling, moving,
/// and cancelling a key are all O(1).
pub(crate) struct TimingWheel {
    buckets: Vec<HashSet<String>>,
    /// key -> bucket index, for O(1) move and cancel.
    slots: HashMap<String, usize>,
    cursor: usize,
    tick: Duration,
}

impl TimingWheel {
    /// Creates a wheel of `bucket_count` buckets advanced every `tick`.
    pub(crate) fn new(tick: Duration, bucket_count: usize) -> Self {
        debug_assert!(!tick.is_zero(), "wheel tick must be non-zero");
        debug_assert!(bucket_count >= 2, "wheel needs at least two buckets");
        Self {
            buckets: vec![HashSet::new(); bucket_count],
            slots: HashMap::new(),
            cursor: 0,
            tick,
        }
    }

    /// Schedules `key` for eviction no earlier than `delay` from now, replacing
    /// any previous schedule for the same key.
    ///
    /// The key lands one tick past its deadline's bucket so a just-written entry
    /// is never evicted before its jittered TTL has fully elapsed. A deadline
    /// beyond the wheel's span lands in the furthest bucket.
    pub(crate) fn schedule(&mut self, key: &str, delay: Duration) {
        if let Some(old) = self.slots.get(key) {
            let _removed = self.buckets[*old].remove(key);
        }

        let ticks = delay.as_nanos().div_ceil(self.tick.as_nanos().max(1)) + 1;
        let ticks = usize::try_from(ticks).unwrap_or(usize::MAX).min(self.buckets.len() - 1);
        let index = (self.cursor + ticks) % self.buckets.len();

        let _inserted = self.buckets[index].insert(key.to_string());
        let _slot = self.slots.insert(key.to_string(), index);
    }

    /// Cancels any pending eviction for `key`.
    pub(crate) fn cancel(&mut self, key: &str) {
        if let Some(index) = self.slots.remove(key) {
            let _removed = self.buckets[index].remove(key);
        }
    }

    /// Advances the cursor by one tick and returns the keys that came due.
    pub(crate) fn advance(&mut self) -> Vec<String> {
        self.cursor = (self.cursor + 1) % self.buckets.len();
        let due = mem::take(&mut self.buckets[self.cursor]);
        for key in &due {
            let _slot = self.slots.remove(key);
        }
        due.into_iter().collect()
    }

    /// Returns the number of scheduled keys.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

impl std::fmt::Debug for TimingWheel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingWheel")
            .field("buckets", &self.buckets.len())
            .field("scheduled", &self.slots.len())
            .field("cursor", &self.cursor)
            .field("tick", &self.tick)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance_ticks(wheel: &mut TimingWheel, ticks: usize) -> Vec<String> {
        let mut due = Vec::new();
        for _ in 0..ticks {
            due.extend(wheel.advance());
        }
        due
    }

    #[test]
    fn key_comes_due_after_its_deadline() {
        let mut wheel = TimingWheel::new(Duration::from_millis(100), 32);
        wheel.schedule("k", Duration::from_millis(1000));

        // ceil(1000/100) + 1 = 11 ticks; nothing before, due on the 11th.
        assert!(advance_ticks(&mut wheel, 10).is_empty());
        assert_eq!(wheel.advance(), vec!["k".to_string()]);
        assert_eq!(wheel.len(), 0);
    }

    #[test]
    fn reschedule_moves_the_key() {
        let mut wheel = TimingWheel::new(Duration::from_millis(100), 32);
        wheel.schedule("k", Duration::from_millis(200));
        wheel.schedule("k", Duration::from_millis(1000));
        assert_eq!(wheel.len(), 1);

        // The original 200ms deadline no longer applies.
        assert!(advance_ticks(&mut wheel, 10).is_empty());
        assert_eq!(wheel.advance(), vec!["k".to_string()]);
    }

    #[test]
    fn cancel_removes_the_pending_eviction() {
        let mut wheel = TimingWheel::new(Duration::from_millis(100), 32);
        wheel.schedule("k", Duration::from_millis(100));
        wheel.cancel("k");

        assert!(advance_ticks(&mut wheel, 32).is_empty());
    }

    #[test]
    fn deadline_beyond_the_span_lands_in_the_furthest_bucket() {
        let mut wheel = TimingWheel::new(Duration::from_millis(100), 8);
        wheel.schedule("k", Duration::from_secs(3600));

        assert!(advance_ticks(&mut wheel, 6).is_empty());
        assert_eq!(wheel.advance(), vec!["k".to_string()]);
    }

    #[test]
    fn distinct_keys_share_a_bucket() {
        let mut wheel = TimingWheel::new(Duration::from_millis(100), 32);
        wheel.schedule("a", Duration::from_millis(500));
        wheel.schedule("b", Duration::from_millis(500));

        let mut due = advance_ticks(&mut wheel, 6);
        due.sort();
        assert_eq!(due, vec!["a".to_string(), "b".to_string()]);
    }
}
