// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-instance cache configuration.
//!
//! Tunables are passed at construction of each cache instance rather than held
//! in process-global state, so instances stay independently testable.

use std::time::Duration;

/// Default fraction by which a nominal TTL is jittered on every write.
pub const DEFAULT_EXPIRY_DEVIATION: f64 = 0.05;

/// Default decay factor. Reserved for future backoff/refresh tuning; no current
/// algorithm consumes it.
pub const DEFAULT_DECAY_FACTOR: f64 = 0.25;

/// Configuration shared by cache tiers and store adapters.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use strata_tier::CacheConfig;
///
/// let config = CacheConfig::new()
///     .with_key_prefix("sessions:")
///     .with_expiry_deviation(0.1);
///
/// assert_eq!(config.prefixed("abc"), "sessions:abc");
/// let ttl = config.jittered_ttl(Duration::from_secs(100));
/// assert!(ttl >= Duration::from_secs(90) && ttl <= Duration::from_secs(110));
/// ```
#[derive(Clone, Debug)]
pub struct CacheConfig {
    key_prefix: Option<String>,
    expiry_deviation: f64,
    decay_factor: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: None,
            expiry_deviation: DEFAULT_EXPIRY_DEVIATION,
            decay_factor: DEFAULT_DECAY_FACTOR,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with the default tunables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key prefix applied by store adapters via [`prefixed`](Self::prefixed).
    ///
    /// The in-process tier stores keys unprefixed; the prefix exists to namespace
    /// entries in a shared remote store.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the expiry deviation fraction `d`; every TTL is multiplied by a
    /// uniformly random factor in `[1 - d, 1 + d]`.
    ///
    /// # Panics
    ///
    /// Panics unless `0.0 <= d < 1.0`.
    #[must_use]
    pub fn with_expiry_deviation(mut self, deviation: f64) -> Self {
        assert!(
            (0.0..1.0).contains(&deviation),
            "expiry deviation must be in [0.0, 1.0), got {deviation}"
        );
        self.expiry_deviation = deviation;
        self
    }

    /// Sets the decay factor. Reserved; declared for configuration completeness
    /// but consumed by no current algorithm.
    #[must_use]
    pub fn with_decay_factor(mut self, decay_factor: f64) -> Self {
        self.decay_factor = decay_factor;
        self
    }

    /// Returns the configured key prefix, if any.
    #[must_use]
    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    /// Returns the expiry deviation fraction.
    #[must_use]
    pub fn expiry_deviation(&self) -> f64 {
        self.expiry_deviation
    }

    /// Returns the reserved decay factor.
    #[must_use]
    pub fn decay_factor(&self) -> f64 {
        self.decay_factor
    }

    /// Applies the configured prefix to `key`.
    #[must_use]
    pub fn prefixed(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{prefix}{key}"),
            None => key.to_string(),
        }
    }

    /// Computes an effective TTL: `nominal × U[1 − d, 1 + d]`.
    ///
    /// Randomizing the deadline spreads out the expiry of entries written at the
    /// same instant, so they do not all fall out of the cache on the same tick.
    #[must_use]
    pub fn jittered_ttl(&self, nominal: Duration) -> Duration {
        let d = self.expiry_deviation;
        let factor = 1.0 - d + fastrand::f64() * d * 2.0;
        nominal.mul_f64(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_tunables() {
        let config = CacheConfig::default();
        assert!(config.key_prefix().is_none());
        assert!((config.expiry_deviation() - DEFAULT_EXPIRY_DEVIATION).abs() < f64::EPSILON);
        assert!((config.decay_factor() - DEFAULT_DECAY_FACTOR).abs() < f64::EPSILON);
    }

    #[test]
    fn jitter_stays_inside_the_deviation_window() {
        let config = CacheConfig::new().with_expiry_deviation(0.05);
        let nominal = Duration::from_secs(100);
        for _ in 0..1000 {
            let ttl = config.jittered_ttl(nominal);
            assert!(ttl >= Duration::from_secs(95), "ttl below window: {ttl:?}");
            assert!(ttl <= Duration::from_secs(105), "ttl above window: {ttl:?}");
        }
    }

    #[test]
    fn zero_deviation_disables_jitter() {
        let config = CacheConfig::new().with_expiry_deviation(0.0);
        let nominal = Duration::from_secs(10);
        assert_eq!(config.jittered_ttl(nominal), nominal);
    }

    #[test]
    fn prefix_is_applied_only_when_configured() {
        let bare = CacheConfig::new();
        assert_eq!(bare.prefixed("k"), "k");

        let prefixed = CacheConfig::new().with_key_prefix("app:");
        assert_eq!(prefixed.prefixed("k"), "app:k");
    }

    #[test]
    #[should_panic(expected = "expiry deviation")]
    fn deviation_out_of_range_panics() {
        drop(CacheConfig::new().with_expiry_deviation(1.5));
    }
}
