//! Click count aggregation.
//!
//! On every tick the pending counters are drained from the cache and applied
//! to the record store as atomic increments. Per-code failures are logged and
//! dropped; the loop itself only stops on shutdown, after one last drain.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{next_tick, ticker};
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheManager;

/// Outcome of one drain-and-apply pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AggregationReport {
    /// Codes written to the store.
    pub applied: usize,
    /// Codes the store no longer knows (deleted links).
    pub unknown: usize,
    /// Codes whose increment failed.
    pub failed: usize,
    /// Clicks written to the store.
    pub clicks: u64,
}

/// Periodic drain-and-apply of click counters.
pub struct ClickAggregator<R: LinkRepository> {
    cache: Arc<CacheManager>,
    repository: Arc<R>,
    interval: Duration,
}

impl<R: LinkRepository + 'static> ClickAggregator<R> {
    pub fn new(cache: Arc<CacheManager>, repository: Arc<R>, interval: Duration) -> Self {
        Self {
            cache,
            repository,
            interval,
        }
    }

    /// Drains every counter tier and applies the merged counts.
    ///
    /// Drained counts are not written back on failure: a failed code loses
    /// this batch's clicks.
    pub async fn run_once(&self) -> AggregationReport {
        let counts = self.cache.drain_all().await;
        let mut report = AggregationReport::default();

        for (code, count) in counts {
            if count == 0 {
                continue;
            }
            let delta = i64::try_from(count).unwrap_or(i64::MAX);

            match self.repository.apply_click_increment(&code, delta).await {
                Ok(true) => {
                    report.applied += 1;
                    report.clicks += count;
                }
                Ok(false) => {
                    warn!("Dropping {} clicks for unknown code {}", count, code);
                    report.unknown += 1;
                }
                Err(e) => {
                    error!("Failed to apply {} clicks for {}: {}", count, code, e);
                    report.failed += 1;
                }
            }
        }

        if report.applied + report.unknown + report.failed > 0 {
            debug!(
                "Click aggregation: {} clicks over {} codes ({} unknown, {} failed)",
                report.clicks, report.applied, report.unknown, report.failed
            );
        }
        report
    }

    /// Runs until `shutdown` flips to `true`, then drains one last time.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Click aggregation started (every {:?})", self.interval);
        let mut ticker = ticker(self.interval);

        while next_tick(&mut ticker, &mut shutdown).await {
            self.run_once().await;
        }

        let report = self.run_once().await;
        info!(
            "Click aggregation stopped, final flush applied {} clicks",
            report.clicks
        );
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
