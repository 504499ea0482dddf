// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Expiry behavior of `MemoryCache`, driven on tokio's paused clock.
//!
//! With the default 0.05 deviation an entry's effective TTL lies in
//! [0.95 t, 1.05 t], and the wheel delays eviction by at most two ticks
//! (t / 8) past the effective deadline.

use std::time::Duration;

use strata_memory::MemoryCache;
use strata_tier::{Cache, CacheConfig, Error};

const TTL: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn entry_lives_through_half_its_ttl_and_dies_past_it() {
    let cache = MemoryCache::new(TTL);
    cache.set("k1", "v1".to_string()).await.expect("set failed");

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(cache.get("k1").await, Ok("v1".to_string()));

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(cache.get("k1").await, Err(Error::NotFound));
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn entry_is_never_evicted_before_the_jitter_window_opens() {
    let cache = MemoryCache::new(TTL);
    cache.set("k", 7).await.expect("set failed");

    // The earliest possible deadline is 0.95 × TTL.
    tokio::time::sleep(Duration::from_millis(930)).await;
    assert_eq!(cache.get("k").await, Ok(7));
}

#[tokio::test(start_paused = true)]
async fn rewrite_refreshes_the_deadline() {
    let cache = MemoryCache::new(TTL);
    cache.set("k", 1).await.expect("set failed");

    tokio::time::sleep(Duration::from_millis(900)).await;
    cache.set("k", 2).await.expect("set failed");

    // Without the refresh the original deadline (≤ 1.175 s with wheel slack)
    // would have passed by now.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(cache.get("k").await, Ok(2));

    // The refreshed deadline eventually passes too.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(cache.get("k").await, Err(Error::NotFound));
}

#[tokio::test(start_paused = true)]
async fn entries_expire_independently() {
    let cache = MemoryCache::new(TTL);
    cache.set("early", 1).await.expect("set failed");

    tokio::time::sleep(Duration::from_millis(600)).await;
    cache.set("late", 2).await.expect("set failed");

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(cache.get("early").await, Err(Error::NotFound));
    assert_eq!(cache.get("late").await, Ok(2));
}

#[tokio::test(start_paused = true)]
async fn delete_cancels_the_pending_eviction() {
    let cache = MemoryCache::new(TTL);
    cache.set("k", 1).await.expect("set failed");
    cache.delete("k");
    assert_eq!(cache.get("k").await, Err(Error::NotFound));

    // Re-using the key after the original deadline shows the old eviction task
    // is gone: the new entry survives its own full window.
    tokio::time::sleep(Duration::from_millis(800)).await;
    cache.set("k", 2).await.expect("set failed");
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(cache.get("k").await, Ok(2));
}

#[tokio::test(start_paused = true)]
async fn zero_deviation_pins_the_deadline_to_the_nominal_ttl() {
    let cache = MemoryCache::with_config(TTL, CacheConfig::new().with_expiry_deviation(0.0));
    cache.set("k", 1).await.expect("set failed");

    tokio::time::sleep(Duration::from_millis(990)).await;
    assert_eq!(cache.get("k").await, Ok(1));

    // Deadline at exactly 1 s, wheel slack at most two ticks (125 ms).
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(cache.get("k").await, Err(Error::NotFound));
}
