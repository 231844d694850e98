//! Two-tier link cache and click counter accumulator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::local::{LocalCounters, LocalTier};
use super::redis_tier::{RedisTier, RedisTierSettings};
use super::tier::{CounterTier, RecordTier};
use crate::domain::entities::Link;

/// Construction parameters for [`CacheManager`].
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Remote tier URL. `None` means memory-only.
    pub redis_url: Option<String>,
    /// TTL applied by both record tiers.
    pub record_ttl: Duration,
    /// Maximum number of records held by the local tier.
    pub max_local_entries: usize,
    /// Self-expiry of remote click counters.
    pub counter_ttl: Duration,
    /// Bound on every remote round trip.
    pub remote_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            record_ttl: Duration::from_secs(3600),
            max_local_entries: 10_000,
            counter_ttl: Duration::from_secs(86_400),
            remote_timeout: Duration::from_millis(500),
        }
    }
}

/// Composes the cache tiers into one read/write-through record cache and one
/// click counter accumulator.
///
/// Record tiers are ordered nearest first; the local tier is always first.
/// Counter tiers are ordered by preference and the local counters are always
/// last, so an increment that no remote tier accepts still lands somewhere.
///
/// Whether a remote tier is present is decided once at construction and never
/// changes. No tier error ever reaches a caller: the worst outcome of any cache
/// fault is a miss.
pub struct CacheManager {
    local: Arc<LocalTier>,
    local_counters: Arc<LocalCounters>,
    record_tiers: Vec<Arc<dyn RecordTier>>,
    counter_tiers: Vec<Arc<dyn CounterTier>>,
    remote: Option<Arc<dyn RecordTier>>,
}

impl CacheManager {
    /// Creates a manager backed only by the in-process tier.
    pub fn memory_only(record_ttl: Duration, max_local_entries: usize) -> Self {
        let local = Arc::new(LocalTier::new(record_ttl, max_local_entries));
        let local_counters = Arc::new(LocalCounters::new());

        Self {
            record_tiers: vec![local.clone() as Arc<dyn RecordTier>],
            counter_tiers: vec![local_counters.clone() as Arc<dyn CounterTier>],
            local,
            local_counters,
            remote: None,
        }
    }

    /// Creates a manager with `remote` as the second record tier and the
    /// preferred counter store.
    pub fn with_remote<R>(record_ttl: Duration, max_local_entries: usize, remote: Arc<R>) -> Self
    where
        R: RecordTier + CounterTier + 'static,
    {
        let mut manager = Self::memory_only(record_ttl, max_local_entries);
        let records = remote.clone() as Arc<dyn RecordTier>;

        manager.record_tiers.push(records.clone());
        manager
            .counter_tiers
            .insert(0, remote as Arc<dyn CounterTier>);
        manager.remote = Some(records);
        manager
    }

    /// Selects tiers from configuration.
    ///
    /// An absent or unreachable Redis is not fatal: a warning is logged and
    /// the manager runs memory-only for the rest of the process lifetime.
    pub async fn connect(settings: &CacheSettings) -> Self {
        let Some(redis_url) = settings.redis_url.as_deref() else {
            info!("Remote cache disabled, using in-process cache only");
            return Self::memory_only(settings.record_ttl, settings.max_local_entries);
        };

        let redis_settings = RedisTierSettings {
            record_ttl: settings.record_ttl,
            counter_ttl: settings.counter_ttl,
            op_timeout: settings.remote_timeout,
        };

        match RedisTier::connect(redis_url, redis_settings).await {
            Ok(redis) => {
                info!("Cache enabled (in-process + Redis)");
                Self::with_remote(
                    settings.record_ttl,
                    settings.max_local_entries,
                    Arc::new(redis),
                )
            }
            Err(e) => {
                warn!("Failed to connect to Redis: {}. Using in-process cache only.", e);
                Self::memory_only(settings.record_ttl, settings.max_local_entries)
            }
        }
    }

    /// Returns true if a remote tier was selected at startup.
    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Name of the remote tier, if any.
    pub fn remote_name(&self) -> Option<&'static str> {
        self.remote.as_ref().map(|r| r.name())
    }

    /// Probes the remote tier. `None` when running memory-only.
    pub async fn remote_healthy(&self) -> Option<bool> {
        let remote = self.remote.as_ref()?;
        Some(remote.health_check().await)
    }

    /// The in-process tier, for inspection.
    pub fn local(&self) -> &LocalTier {
        &self.local
    }

    /// Looks a record up tier by tier, nearest first.
    ///
    /// A hit in a farther tier repopulates every nearer tier. Tier errors and
    /// malformed payloads count as misses.
    pub async fn get(&self, code: &str) -> Option<Link> {
        for (depth, tier) in self.record_tiers.iter().enumerate() {
            match tier.get(code).await {
                Ok(Some(link)) => {
                    debug!("Cache HIT ({}): {}", tier.name(), code);
                    for nearer in &self.record_tiers[..depth] {
                        if let Err(e) = nearer.set(code, &link).await {
                            warn!("Cache backfill failed ({}) for {}: {}", nearer.name(), code, e);
                        }
                    }
                    return Some(link);
                }
                Ok(None) => {}
                Err(e) => warn!("Cache GET failed ({}) for {}: {}", tier.name(), code, e),
            }
        }

        debug!("Cache MISS: {}", code);
        None
    }

    /// Writes a record to every tier. Failures are logged and skipped; they
    /// never undo the write to another tier.
    pub async fn set(&self, code: &str, link: &Link) {
        for tier in &self.record_tiers {
            if let Err(e) = tier.set(code, link).await {
                warn!("Cache SET failed ({}) for {}: {}", tier.name(), code, e);
            }
        }
    }

    /// Removes a record from every tier.
    pub async fn delete(&self, code: &str) {
        for tier in &self.record_tiers {
            if let Err(e) = tier.delete(code).await {
                warn!("Cache DELETE failed ({}) for {}: {}", tier.name(), code, e);
            }
        }
    }

    /// Registers one click without making the caller wait.
    ///
    /// The bookkeeping runs as its own task. The returned handle may be
    /// dropped; awaiting it is only useful in tests and shutdown paths.
    pub fn increment(self: &Arc<Self>, code: &str) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let code = code.to_string();
        tokio::spawn(async move { manager.record_click(&code).await })
    }

    /// Adds one click to the first counter tier that accepts it.
    ///
    /// A remote increment that times out on the client but succeeded on the
    /// server is counted twice once the fallback also records it.
    pub async fn record_click(&self, code: &str) {
        for tier in &self.counter_tiers {
            match tier.increment(code).await {
                Ok(()) => return,
                Err(e) => warn!(
                    "Counter INCR failed ({}) for {}, falling back: {}",
                    tier.name(),
                    code,
                    e
                ),
            }
        }

        error!("Click for {} dropped: no counter tier accepted it", code);
    }

    /// Reads and removes every pending counter from every tier and merges them
    /// by code.
    ///
    /// A tier that fails to drain contributes nothing this round and keeps its
    /// counters for the next one.
    pub async fn drain_all(&self) -> HashMap<String, u64> {
        let mut merged: HashMap<String, u64> = HashMap::new();

        for tier in &self.counter_tiers {
            match tier.drain().await {
                Ok(counts) => {
                    for (code, count) in counts {
                        *merged.entry(code).or_insert(0) += count;
                    }
                }
                Err(e) => warn!("Counter drain failed ({}): {}", tier.name(), e),
            }
        }

        merged
    }

    /// Administrative reset of every counter in every tier. Idempotent.
    pub async fn clear(&self) {
        for tier in &self.counter_tiers {
            if let Err(e) = tier.clear().await {
                warn!("Counter clear failed ({}): {}", tier.name(), e);
            }
        }
    }

    /// Pending local counter for `code`, excluding remote counters.
    pub fn pending_local_clicks(&self, code: &str) -> u64 {
        self.local_counters.pending(code)
    }

    /// Drops expired entries from the in-process tier.
    pub fn purge_expired(&self) -> usize {
        self.local.purge_expired()
    }
}
