//! Cache tier traits and error types.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::entities::Link;

/// Errors that can occur inside a single cache tier.
///
/// These never leave [`super::CacheManager`]: the manager logs them and
/// degrades to a miss, a skipped tier, or the local counter fallback.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache tier unavailable: {0}")]
    Unavailable(String),

    #[error("cache operation timed out after {0}ms")]
    Timeout(u128),

    #[error("malformed cached payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Result type for cache tier operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// One layer of the link record cache.
///
/// Each tier applies its own fixed TTL, chosen at construction and counted
/// from the last `set`. Implementations must be safe for concurrent use from
/// many redirect tasks.
///
/// # Implementations
///
/// - [`super::LocalTier`] - in-process bounded LRU map
/// - [`super::RedisTier`] - shared Redis instance
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordTier: Send + Sync {
    /// Short name used in logs and health output.
    fn name(&self) -> &'static str;

    /// Returns the cached record, or `Ok(None)` on a miss.
    async fn get(&self, code: &str) -> CacheResult<Option<Link>>;

    /// Stores (or replaces) the record, restarting its TTL.
    async fn set(&self, code: &str, link: &Link) -> CacheResult<()>;

    /// Removes the record. Removing an absent key is not an error.
    async fn delete(&self, code: &str) -> CacheResult<()>;

    /// Checks if the tier backend is reachable.
    ///
    /// Used by the health endpoint to report cache status.
    async fn health_check(&self) -> bool;
}

/// A store of pending click counters keyed by short code.
///
/// Absent keys are implicitly zero.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterTier: Send + Sync {
    /// Short name used in logs and health output.
    fn name(&self) -> &'static str;

    /// Adds one click for `code`.
    async fn increment(&self, code: &str) -> CacheResult<()>;

    /// Reads and removes every pending counter.
    ///
    /// A drained key must read as zero until it is incremented again.
    async fn drain(&self) -> CacheResult<HashMap<String, u64>>;

    /// Removes every pending counter without reporting them.
    async fn clear(&self) -> CacheResult<()>;
}
