//! Link lifecycle service and cache write-through path.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::entities::{Link, LinkFilter, LinkPatch, LinkStats, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheManager;
use crate::utils::code_generator::code_for_url;
use crate::utils::url_normalizer::normalize_url;

/// Actor allowed to act on links created by anyone.
pub const ADMIN_ACTOR: &str = "admin";

/// Page size used when the requested one is out of range.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of a link listing.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPage {
    pub items: Vec<Link>,
    /// Matches across all pages.
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl LinkPage {
    pub fn total_pages(&self) -> i64 {
        let size = i64::from(self.page_size);
        (self.total + size - 1) / size
    }
}

/// Tunables for [`LinkService`].
#[derive(Debug, Clone)]
pub struct LinkSettings {
    /// Domain used to render short URLs of links without a custom domain.
    pub public_domain: String,
    pub max_url_length: usize,
    /// Expiry applied to new links created without one. `None` means links
    /// never expire by default.
    pub default_expiry: Option<TimeDelta>,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            public_domain: "localhost:3000".to_string(),
            max_url_length: 2048,
            default_expiry: Some(TimeDelta::hours(8760)),
        }
    }
}

/// Input for [`LinkService::create_link`].
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub long_url: String,
    pub title: String,
    pub description: String,
    pub custom_domain: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: String,
}

/// Service for managing short links.
///
/// Every mutation goes to the repository first. Only after the store confirms
/// the write is the cache touched: live rows are published, everything else
/// is invalidated. Cache faults never change the result of a mutation.
pub struct LinkService<R: LinkRepository> {
    repository: Arc<R>,
    cache: Arc<CacheManager>,
    settings: LinkSettings,
}

impl<R: LinkRepository> LinkService<R> {
    /// Creates a new link service.
    pub fn new(repository: Arc<R>, cache: Arc<CacheManager>, settings: LinkSettings) -> Self {
        Self {
            repository,
            cache,
            settings,
        }
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Renders the public short URL of a link.
    pub fn short_url(&self, link: &Link) -> String {
        link.full_url(&self.settings.public_domain)
    }

    /// Creates a short link.
    ///
    /// The target is validated and normalized, the code is derived from the
    /// normalized target, and the default expiry is applied when none is
    /// given.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is rejected.
    /// Returns [`AppError::Conflict`] if the target is already shortened or the
    /// derived code is taken by another target.
    pub async fn create_link(&self, input: CreateLink) -> Result<Link, AppError> {
        let long_url = normalize_url(&input.long_url, self.settings.max_url_length).map_err(|e| {
            AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() }))
        })?;

        if let Some(existing) = self.repository.find_by_long_url(&long_url).await? {
            return Err(AppError::conflict(
                "URL has already been shortened",
                json!({ "code": existing.code }),
            ));
        }

        let code = code_for_url(&long_url);
        if self.repository.find_by_code(&code).await?.is_some() {
            return Err(AppError::conflict(
                "Short code collision",
                json!({ "code": code }),
            ));
        }

        // An expiry past the representable range leaves the link permanent.
        let expires_at = input.expires_at.or_else(|| {
            self.settings
                .default_expiry
                .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        });

        let link = self
            .repository
            .create(NewLink {
                code,
                long_url,
                title: input.title,
                description: input.description,
                custom_domain: input.custom_domain,
                expires_at,
                created_by: input.created_by,
            })
            .await?;

        info!("Created link {} -> {}", self.short_url(&link), link.long_url);
        self.sync(&link).await;
        Ok(link)
    }

    /// Partially updates a link and returns the re-read row.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty patch or an invalid URL.
    /// Returns [`AppError::NotFound`] if the link does not exist.
    pub async fn update_link(&self, id: i64, mut patch: LinkPatch) -> Result<Link, AppError> {
        if patch.is_empty() {
            return Err(AppError::bad_request("Nothing to update", json!({ "id": id })));
        }

        if let Some(long_url) = patch.long_url.take() {
            let normalized = normalize_url(&long_url, self.settings.max_url_length).map_err(|e| {
                AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() }))
            })?;
            patch.long_url = Some(normalized);
        }

        if !self.repository.update(id, patch).await? {
            return Err(link_not_found(id));
        }

        self.reload_and_sync(id).await
    }

    /// Flips the active flag of a link and returns the re-read row.
    pub async fn toggle_link(&self, id: i64) -> Result<Link, AppError> {
        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| link_not_found(id))?;

        let patch = LinkPatch {
            is_active: Some(!current.is_active),
            ..Default::default()
        };
        if !self.repository.update(id, patch).await? {
            return Err(link_not_found(id));
        }

        self.reload_and_sync(id).await
    }

    /// Sets the active flag on several links.
    ///
    /// Non-admin actors only affect their own links; other ids are skipped.
    /// Returns the rows that changed.
    pub async fn batch_toggle(
        &self,
        ids: Vec<i64>,
        active: bool,
        actor: &str,
    ) -> Result<Vec<Link>, AppError> {
        let ids = dedup_ids(ids)?;

        let links = self
            .repository
            .set_active_many(ids, active, owner_scope(actor))
            .await?;

        for link in &links {
            self.sync(link).await;
        }

        debug!("Batch toggle by {}: {} links -> active={}", actor, links.len(), active);
        Ok(links)
    }

    /// Soft-deletes a link and invalidates its cache entries.
    pub async fn delete_link(&self, id: i64) -> Result<(), AppError> {
        let link = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| link_not_found(id))?;

        if !self.repository.soft_delete(id).await? {
            return Err(link_not_found(id));
        }

        self.cache.delete(&link.code).await;
        info!("Deleted link {}", link.code);
        Ok(())
    }

    /// Soft-deletes several links. Returns how many were deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] without deleting anything if any id is
    /// missing or, for non-admin actors, owned by someone else.
    pub async fn delete_many(&self, ids: Vec<i64>, actor: &str) -> Result<usize, AppError> {
        let ids = dedup_ids(ids)?;
        let requested = ids.len();

        let deleted = self
            .repository
            .soft_delete_many(ids, owner_scope(actor))
            .await?;

        if deleted.len() != requested {
            return Err(AppError::not_found(
                "Some links do not exist or are not owned by the caller",
                json!({ "requested": requested }),
            ));
        }

        for link in &deleted {
            self.cache.delete(&link.code).await;
        }

        info!("Batch delete by {}: {} links", actor, deleted.len());
        Ok(deleted.len())
    }

    /// Fetches one link by id.
    pub async fn get_link(&self, id: i64) -> Result<Link, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| link_not_found(id))
    }

    /// Lists links newest first.
    ///
    /// A page below 1 reads as the first page and a page size outside
    /// `1..=MAX_PAGE_SIZE` falls back to [`DEFAULT_PAGE_SIZE`]. A blank search
    /// term is ignored. Non-admin actors only see their own links.
    pub async fn list_links(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
        actor: &str,
    ) -> Result<LinkPage, AppError> {
        let page = page.max(1);
        let page_size = if (1..=MAX_PAGE_SIZE).contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };

        let filter = LinkFilter {
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            owner: owner_scope(actor),
        };
        let offset = i64::from(page - 1) * i64::from(page_size);

        let (items, total) = self
            .repository
            .list(filter, offset, i64::from(page_size))
            .await?;

        Ok(LinkPage {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Link and click totals, scoped to the actor unless it is the admin.
    pub async fn link_stats(&self, actor: &str) -> Result<LinkStats, AppError> {
        self.repository.stats(owner_scope(actor)).await
    }

    /// Active links past their expiry that the sweep has not caught yet.
    pub async fn expired_links(&self) -> Result<Vec<Link>, AppError> {
        self.repository.find_expired().await
    }

    /// Deactivates expired links and invalidates them. Returns how many were
    /// deactivated.
    pub async fn sweep_expired(&self) -> Result<usize, AppError> {
        let codes = self.repository.deactivate_expired().await?;

        for code in &codes {
            self.cache.delete(code).await;
        }

        if !codes.is_empty() {
            info!("Deactivated {} expired links", codes.len());
        }
        Ok(codes.len())
    }

    /// Resolves a short code for the redirect path.
    ///
    /// A cached record that is no longer live is invalidated and reported as
    /// not found. On a cache miss the record store is consulted and a live
    /// row is published.
    ///
    /// # Errors
    ///
    /// Only record store failures are returned; cache faults read as misses.
    pub async fn resolve(&self, code: &str) -> Result<Option<Link>, AppError> {
        if let Some(link) = self.cache.get(code).await {
            if link.is_live() {
                return Ok(Some(link));
            }
            debug!("Cached link {} is no longer live", code);
            self.cache.delete(code).await;
            return Ok(None);
        }

        match self.repository.find_by_code(code).await? {
            Some(link) if link.is_live() => {
                self.cache.set(code, &link).await;
                Ok(Some(link))
            }
            _ => Ok(None),
        }
    }

    /// Registers one click for `code` without waiting for the bookkeeping.
    pub fn register_click(&self, code: &str) -> JoinHandle<()> {
        self.cache.increment(code)
    }

    /// Loads every active, unexpired link into the cache. Returns how many
    /// were loaded.
    pub async fn warm_up(&self) -> Result<usize, AppError> {
        let links = self.repository.find_active_unexpired().await?;

        for link in &links {
            self.cache.set(&link.code, link).await;
        }

        Ok(links.len())
    }

    async fn reload_and_sync(&self, id: i64) -> Result<Link, AppError> {
        let link = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| link_not_found(id))?;

        self.sync(&link).await;
        Ok(link)
    }

    /// Publishes a live row, invalidates anything else.
    async fn sync(&self, link: &Link) {
        if link.is_live() {
            self.cache.set(&link.code, link).await;
        } else {
            self.cache.delete(&link.code).await;
        }
    }
}

fn link_not_found(id: i64) -> AppError {
    AppError::not_found("Link not found", json!({ "id": id }))
}

/// `None` lets the repository touch every row; otherwise rows are limited to
/// the actor's own.
fn owner_scope(actor: &str) -> Option<String> {
    if actor == ADMIN_ACTOR {
        None
    } else {
        Some(actor.to_string())
    }
}

fn dedup_ids(mut ids: Vec<i64>) -> Result<Vec<i64>, AppError> {
    if ids.is_empty() {
        return Err(AppError::bad_request("No links selected", json!({})));
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}
