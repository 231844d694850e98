//! Two-tier link cache and click counter store.
//!
//! - [`LocalTier`] / [`LocalCounters`] - in-process, always present
//! - [`RedisTier`] - optional shared tier, selected once at startup
//! - [`CacheManager`] - composes the tiers and hides their failures
//!
//! Tier traits ([`RecordTier`], [`CounterTier`]) are public so tests and
//! alternative backends can plug in their own implementations.

mod local;
mod manager;
mod redis_tier;
mod tier;

pub use local::{LocalCounters, LocalTier};
pub use manager::{CacheManager, CacheSettings};
pub use redis_tier::{RedisTier, RedisTierSettings};
pub use tier::{CacheError, CacheResult, CounterTier, RecordTier};
