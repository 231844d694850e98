//! In-process cache tier and counter store.

use std::collections::HashMap;
use std::mem;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use super::tier::{CacheResult, CounterTier, RecordTier};
use crate::domain::entities::Link;

/// A cached record and its deadline. `None` never expires.
struct Slot {
    link: Link,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// First-level record cache: a bounded LRU map with a fixed TTL.
///
/// Reads refresh recency but not expiry. Once the entry count reaches
/// `max_entries` the least recently used entry is evicted. All structural
/// changes happen under one short-lived mutex that is never held across an
/// `.await`.
pub struct LocalTier {
    entries: Mutex<LruCache<String, Slot>>,
    ttl: Duration,
}

impl LocalTier {
    /// Creates an empty tier. A `max_entries` of zero is treated as one.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Returns a live entry and marks it most recently used.
    pub fn lookup(&self, code: &str) -> Option<Link> {
        let mut entries = self.entries.lock();

        if entries.peek(code)?.is_expired(Instant::now()) {
            entries.pop(code);
            debug!("Local cache EXPIRED: {}", code);
            return None;
        }

        entries.get(code).map(|slot| slot.link.clone())
    }

    /// Inserts or replaces an entry, restarting its TTL. Evicts the least
    /// recently used entry when full.
    ///
    /// A TTL too large to represent as a deadline means the entry never
    /// expires on its own.
    pub fn store(&self, code: &str, link: Link) {
        let slot = Slot {
            link,
            expires_at: Instant::now().checked_add(self.ttl),
        };

        if let Some((victim, _)) = self.entries.lock().push(code.to_string(), slot)
            && victim != code
        {
            debug!("Local cache EVICT: {}", victim);
        }
    }

    pub fn remove(&self, code: &str) -> bool {
        self.entries.lock().pop(code).is_some()
    }

    /// Returns true if a live entry exists, without touching its recency.
    pub fn contains(&self, code: &str) -> bool {
        self.entries
            .lock()
            .peek(code)
            .is_some_and(|slot| !slot.is_expired(Instant::now()))
    }

    /// Number of entries currently held, including not-yet-purged expired ones.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, slot)| slot.is_expired(now))
            .map(|(code, _)| code.clone())
            .collect();

        for code in &expired {
            entries.pop(code);
        }

        expired.len()
    }
}

#[async_trait]
impl RecordTier for LocalTier {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get(&self, code: &str) -> CacheResult<Option<Link>> {
        Ok(self.lookup(code))
    }

    async fn set(&self, code: &str, link: &Link) -> CacheResult<()> {
        self.store(code, link.clone());
        Ok(())
    }

    async fn delete(&self, code: &str) -> CacheResult<()> {
        self.remove(code);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// In-process click counters, used when the remote tier is disabled or failing.
///
/// Guarded by its own mutex so counter writes never contend with record reads.
#[derive(Default)]
pub struct LocalCounters {
    counts: Mutex<HashMap<String, u64>>,
}

impl LocalCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, code: &str) {
        *self.counts.lock().entry(code.to_string()).or_insert(0) += 1;
    }

    /// Takes the whole map in one critical section.
    pub fn take(&self) -> HashMap<String, u64> {
        mem::take(&mut *self.counts.lock())
    }

    pub fn pending(&self, code: &str) -> u64 {
        self.counts.lock().get(code).copied().unwrap_or(0)
    }
}

#[async_trait]
impl CounterTier for LocalCounters {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn increment(&self, code: &str) -> CacheResult<()> {
        self.add(code);
        Ok(())
    }

    async fn drain(&self) -> CacheResult<HashMap<String, u64>> {
        Ok(self.take())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.counts.lock().clear();
        Ok(())
    }
}
