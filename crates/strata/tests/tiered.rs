// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use strata::{Cache, Error, TieredCache};
use strata_tier::testing::{CacheOp, MockCache};

const TTL: Duration = Duration::from_secs(1);

#[tokio::test]
async fn load_populates_both_tiers() {
    let remote = MockCache::new();
    let tiered = TieredCache::new(remote.clone(), TTL);
    let calls = AtomicUsize::new(0);

    let value = tiered
        .load("k", || async {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok::<_, Error>("loaded".to_string())
        })
        .await
        .expect("load failed");
    assert_eq!(value, "loaded");
    assert_eq!(remote.get("k").await, Ok("loaded".to_string()));

    // The second load is a local hit; the remote tier sees no new reads.
    let reads_so_far = remote.gets_for("k");
    let value = tiered
        .load("k", || async {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok::<_, Error>("reloaded".to_string())
        })
        .await
        .expect("load failed");
    assert_eq!(value, "loaded");
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(remote.gets_for("k"), reads_so_far);
}

#[tokio::test(start_paused = true)]
async fn lapsed_local_entry_is_refilled_from_the_remote_tier() {
    let remote = MockCache::new();
    let tiered = TieredCache::new(remote.clone(), TTL);
    let calls = AtomicUsize::new(0);

    tiered
        .load("k", || async {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok::<_, Error>("loaded".to_string())
        })
        .await
        .expect("load failed");

    // The local tier holds entries for TTL / 4; well past that, the value is
    // still in the remote tier so the loader must not run again.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let reads_before = remote.gets_for("k");
    let value = tiered
        .load("k", || async {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok::<_, Error>("reloaded".to_string())
        })
        .await
        .expect("load failed");
    assert_eq!(value, "loaded");
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(remote.gets_for("k"), reads_before + 1);

    // And the hit was written back: the next read is local again.
    let reads_after = remote.gets_for("k");
    assert_eq!(tiered.get("k").await, Ok("loaded".to_string()));
    assert_eq!(remote.gets_for("k"), reads_after);
}

#[tokio::test]
async fn direct_set_reaches_the_remote_tier_first() {
    let remote = MockCache::new();
    let tiered = TieredCache::new(remote.clone(), TTL);

    tiered.set("k", "v".to_string()).await.expect("set failed");
    assert_eq!(remote.get("k").await, Ok("v".to_string()));
    assert_eq!(tiered.get("k").await, Ok("v".to_string()));
}

#[tokio::test]
async fn rejected_remote_write_leaves_the_local_tier_empty() {
    let remote = MockCache::new();
    remote.fail_when(|op| matches!(op, CacheOp::Set { .. }));
    let tiered = TieredCache::new(remote.clone(), TTL);

    assert!(matches!(tiered.set("k", "v".to_string()).await, Err(Error::Backend(_))));
    remote.fail_never();
    // Neither tier holds the value.
    assert_eq!(tiered.get("k").await, Err(Error::NotFound));
}

#[tokio::test]
async fn remote_miss_everywhere_is_not_found() {
    let tiered = TieredCache::<String>::new(MockCache::new(), TTL);
    assert_eq!(tiered.get("absent").await, Err(Error::NotFound));
}
