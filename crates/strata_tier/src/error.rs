// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.

use std::fmt;

/// An error from a cache operation.
///
/// [`Error::NotFound`] is a sentinel, not a failure: it is the expected outcome of
/// a miss and is never logged as an error by the composition layer. The other
/// variants represent genuine failures.
///
/// The type is `Clone` so a single outcome can be fanned out to every follower of
/// a deduplicated execution.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The key is not present in the tier.
    #[error("record not found")]
    NotFound,

    /// A backing store failed: network, serialization, or storage trouble, or a
    /// failing user-supplied load function.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A user-supplied computation terminated abnormally (panic, or its executing
    /// future was dropped mid-flight).
    #[error("load aborted: {0}")]
    Aborted(String),
}

impl Error {
    /// Creates a [`Error::Backend`] from anything that can describe itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_tier::Error;
    ///
    /// let error = Error::backend("connection refused");
    /// assert_eq!(error.to_string(), "cache backend error: connection refused");
    /// ```
    pub fn backend(cause: impl fmt::Display) -> Self {
        Self::Backend(cause.to_string())
    }

    /// Creates a [`Error::Aborted`] from anything that can describe itself.
    pub fn aborted(cause: impl fmt::Display) -> Self {
        Self::Aborted(cause.to_string())
    }

    /// Returns `true` for the miss sentinel.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
