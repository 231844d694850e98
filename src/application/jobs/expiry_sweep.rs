//! Periodic expired-link sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{next_tick, ticker};
use crate::application::services::LinkService;
use crate::domain::repositories::LinkRepository;

/// Deactivates links past their expiry and drops expired local cache entries.
pub struct ExpirySweeper<R: LinkRepository> {
    service: Arc<LinkService<R>>,
    interval: Duration,
}

impl<R: LinkRepository + 'static> ExpirySweeper<R> {
    pub fn new(service: Arc<LinkService<R>>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Returns the number of links deactivated in the record store.
    pub async fn run_once(&self) -> usize {
        let deactivated = match self.service.sweep_expired().await {
            Ok(n) => n,
            Err(e) => {
                error!("Expired link sweep failed: {}", e);
                0
            }
        };

        let purged = self.service.cache().purge_expired();
        if purged > 0 {
            debug!("Purged {} expired local cache entries", purged);
        }

        deactivated
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Expiry sweeper started (every {:?})", self.interval);
        let mut ticker = ticker(self.interval);

        while next_tick(&mut ticker, &mut shutdown).await {
            self.run_once().await;
        }

        info!("Expiry sweeper stopped");
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
