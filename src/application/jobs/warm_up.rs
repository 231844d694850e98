//! Startup cache warm-up.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::application::services::LinkService;
use crate::domain::repositories::LinkRepository;

/// Loads every active, unexpired link into the cache in the background.
///
/// Request serving does not wait for this; early redirects fall back to the
/// record store until the cache is warm.
pub fn spawn_warm_up<R: LinkRepository + 'static>(service: Arc<LinkService<R>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let started = std::time::Instant::now();
        match service.warm_up().await {
            Ok(n) => info!("Cache warm-up loaded {} links in {:?}", n, started.elapsed()),
            Err(e) => error!("Cache warm-up failed: {}", e),
        }
    })
}
