use std::sync::Arc;

use crate::application::services::LinkService;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheManager;
use crate::infrastructure::persistence::PgLinkRepository;

/// Shared state injected into every handler.
///
/// Generic over the record store so handlers can be exercised against an
/// in-memory repository.
pub struct AppState<R: LinkRepository = PgLinkRepository> {
    pub link_service: Arc<LinkService<R>>,
    pub cache: Arc<CacheManager>,
}

impl<R: LinkRepository> AppState<R> {
    pub fn new(link_service: Arc<LinkService<R>>) -> Self {
        let cache = link_service.cache().clone();
        Self {
            link_service,
            cache,
        }
    }
}

impl<R: LinkRepository> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            link_service: self.link_service.clone(),
            cache: self.cache.clone(),
        }
    }
}
