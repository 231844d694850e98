//! Background jobs owned by the server process.
//!
//! Every periodic job takes a `watch::Receiver<bool>` shutdown signal and is
//! spawned onto a `JoinHandle` the server joins on exit.
//!
//! - [`aggregation`] - drains click counters into the record store
//! - [`expiry_sweep`] - deactivates expired links and purges stale cache entries
//! - [`warm_up`] - one-shot cache warm-up at startup

pub mod aggregation;
pub mod expiry_sweep;
pub mod warm_up;

pub use aggregation::{AggregationReport, ClickAggregator};
pub use expiry_sweep::ExpirySweeper;
pub use warm_up::spawn_warm_up;

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};

/// Builds a ticker whose first tick fires one full `period` from now.
pub(crate) fn ticker(period: Duration) -> Interval {
    let start = tokio::time::Instant::now() + period;
    let mut ticker = tokio::time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Waits for the next tick. Returns `false` once shutdown was requested or
/// the shutdown sender is gone.
pub(crate) async fn next_tick(ticker: &mut Interval, shutdown: &mut watch::Receiver<bool>) -> bool {
    loop {
        if *shutdown.borrow_and_update() {
            return false;
        }

        tokio::select! {
            _ = ticker.tick() => return true,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
        }
    }
}
