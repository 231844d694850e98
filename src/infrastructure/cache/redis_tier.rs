//! Redis-backed remote cache tier and counter store.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, RedisResult, aio::ConnectionManager};
use tracing::{debug, info, warn};

use super::tier::{CacheError, CacheResult, CounterTier, RecordTier};
use crate::domain::entities::Link;

const RECORD_PREFIX: &str = "url:";
const COUNTER_PREFIX: &str = "clicks:";
const SCAN_BATCH: usize = 500;
const DEL_BATCH: usize = 500;

/// Timing parameters for [`RedisTier`].
#[derive(Debug, Clone, Copy)]
pub struct RedisTierSettings {
    /// TTL applied to cached records on every `set`.
    pub record_ttl: Duration,
    /// TTL refreshed on every counter increment, so abandoned counters expire.
    pub counter_ttl: Duration,
    /// Upper bound for any single round trip, including the initial connect.
    pub op_timeout: Duration,
}

/// Second-level cache and shared counter store backed by Redis.
///
/// Records are stored as JSON under `url:{code}`, counters as integers under
/// `clicks:{code}`. Every command is bounded by `op_timeout`; a timeout is
/// reported as [`CacheError::Timeout`] and handled by the caller like any
/// other tier failure.
pub struct RedisTier {
    conn: ConnectionManager,
    settings: RedisTierSettings,
}

impl RedisTier {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] if the URL is invalid or the server
    /// refuses the connection, [`CacheError::Timeout`] if connecting or the
    /// PING takes longer than `settings.op_timeout`.
    pub async fn connect(redis_url: &str, settings: RedisTierSettings) -> CacheResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::Unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        let conn = match tokio::time::timeout(settings.op_timeout, ConnectionManager::new(client))
            .await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(CacheError::Unavailable(format!(
                    "Failed to connect to Redis: {}",
                    e
                )));
            }
            Err(_) => return Err(CacheError::Timeout(settings.op_timeout.as_millis())),
        };

        let tier = Self { conn, settings };
        if !tier.ping().await {
            return Err(CacheError::Unavailable("Redis PING failed".to_string()));
        }

        info!("✓ Connected to Redis");
        Ok(tier)
    }

    /// Returns true if the server answers a PING within the operation timeout.
    pub async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        let cmd = redis::cmd("PING");
        self.bounded(cmd.query_async::<String>(&mut conn))
            .await
            .is_ok()
    }

    fn record_key(code: &str) -> String {
        format!("{}{}", RECORD_PREFIX, code)
    }

    fn counter_key(code: &str) -> String {
        format!("{}{}", COUNTER_PREFIX, code)
    }

    fn ttl_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }

    async fn bounded<T, F>(&self, fut: F) -> CacheResult<T>
    where
        F: Future<Output = RedisResult<T>> + Send,
    {
        bounded(self.settings.op_timeout, fut).await
    }

    /// Collects every counter key with cursor-based SCAN.
    async fn counter_keys(&self) -> CacheResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", COUNTER_PREFIX);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let mut cmd = redis::cmd("SCAN");
            cmd.arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH);

            let (next, batch): (u64, Vec<String>) =
                self.bounded(cmd.query_async(&mut conn)).await?;
            keys.extend(batch);

            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once.
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }
}

/// Runs one Redis round trip under `op_timeout`.
pub(super) async fn bounded<T, F>(op_timeout: Duration, fut: F) -> CacheResult<T>
where
    F: Future<Output = RedisResult<T>> + Send,
{
    match tokio::time::timeout(op_timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CacheError::Backend(e.to_string())),
        Err(_) => Err(CacheError::Timeout(op_timeout.as_millis())),
    }
}

#[async_trait]
impl RecordTier for RedisTier {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, code: &str) -> CacheResult<Option<Link>> {
        let key = Self::record_key(code);
        let mut conn = self.conn.clone();

        let Some(payload) = self
            .bounded(conn.get::<_, Option<String>>(&key))
            .await?
        else {
            debug!("Redis MISS: {}", code);
            return Ok(None);
        };

        let link: Link = match serde_json::from_str(&payload) {
            Ok(link) => link,
            Err(e) => {
                // Unreadable entries would fail again on every miss until they expire.
                if let Err(del) = self.bounded(conn.del::<_, i64>(&key)).await {
                    warn!("Failed to drop malformed Redis entry {}: {}", key, del);
                }
                return Err(e.into());
            }
        };
        debug!("Redis HIT: {} -> {}", code, link.long_url);
        Ok(Some(link))
    }

    async fn set(&self, code: &str, link: &Link) -> CacheResult<()> {
        let key = Self::record_key(code);
        let payload = serde_json::to_string(link)?;
        let ttl = Self::ttl_secs(self.settings.record_ttl);
        let mut conn = self.conn.clone();

        self.bounded(conn.set_ex::<_, _, ()>(&key, payload, ttl))
            .await?;
        debug!("Redis SET: {} (TTL: {}s)", code, ttl);
        Ok(())
    }

    async fn delete(&self, code: &str) -> CacheResult<()> {
        let key = Self::record_key(code);
        let mut conn = self.conn.clone();

        let deleted = self.bounded(conn.del::<_, i64>(&key)).await?;
        if deleted > 0 {
            debug!("Redis DEL: {}", code);
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.ping().await
    }
}

#[async_trait]
impl CounterTier for RedisTier {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn increment(&self, code: &str) -> CacheResult<()> {
        let key = Self::counter_key(code);
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("INCR")
            .arg(&key)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(Self::ttl_secs(self.settings.counter_ttl));

        let (count, _): (i64, i64) = self.bounded(pipe.query_async(&mut conn)).await?;
        debug!("Redis INCR: {} -> {}", code, count);
        Ok(())
    }

    /// Drains counters key by key with GETDEL.
    ///
    /// A key whose GETDEL fails is left in place for the next drain. A GETDEL
    /// that times out client-side but completed on the server loses that
    /// key's count.
    async fn drain(&self) -> CacheResult<HashMap<String, u64>> {
        let keys = self.counter_keys().await?;
        let mut conn = self.conn.clone();
        let mut counts = HashMap::with_capacity(keys.len());

        for key in keys {
            let mut cmd = redis::cmd("GETDEL");
            cmd.arg(&key);

            let raw = match self
                .bounded(cmd.query_async::<Option<String>>(&mut conn))
                .await
            {
                Ok(Some(raw)) => raw,
                // Expired or drained by another instance since the scan.
                Ok(None) => continue,
                Err(e) => {
                    warn!("Redis GETDEL failed for {}: {}", key, e);
                    continue;
                }
            };

            let code = key.strip_prefix(COUNTER_PREFIX).unwrap_or(&key).to_string();
            match raw.parse::<u64>() {
                Ok(0) => {}
                Ok(count) => *counts.entry(code).or_insert(0) += count,
                Err(e) => warn!("Discarding malformed counter {} = {:?}: {}", key, raw, e),
            }
        }

        Ok(counts)
    }

    async fn clear(&self) -> CacheResult<()> {
        let keys = self.counter_keys().await?;
        let mut conn = self.conn.clone();

        for chunk in keys.chunks(DEL_BATCH) {
            let mut cmd = redis::cmd("DEL");
            cmd.arg(chunk.to_vec());
            self.bounded(cmd.query_async::<i64>(&mut conn)).await?;
        }

        debug!("Redis counters cleared ({} keys)", keys.len());
        Ok(())
    }
}
