//! Repository trait for short link data access.

use crate::domain::entities::{Link, LinkFilter, LinkPatch, LinkStats, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the durable record store.
///
/// Soft-deleted rows are invisible to every lookup. Callers that keep a cache
/// in front of the store (see [`crate::application::services::LinkService`])
/// must only touch the cache after these methods report success.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code is already taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a non-deleted link by its short code.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Finds a non-deleted link by its primary key.
    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Finds a non-deleted link pointing at `long_url`.
    ///
    /// Used to reject shortening the same target twice.
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<Link>, AppError>;

    /// Returns every active, unexpired link. Used to warm the cache at startup.
    async fn find_active_unexpired(&self) -> Result<Vec<Link>, AppError>;

    /// Atomically adds `delta` to the persisted click counter of `code`.
    ///
    /// Returns `Ok(false)` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn apply_click_increment(&self, code: &str, delta: i64) -> Result<bool, AppError>;

    /// Partially updates a link. Only fields present in [`LinkPatch`] change.
    ///
    /// Returns `Ok(false)` if no row matched.
    async fn update(&self, id: i64, patch: LinkPatch) -> Result<bool, AppError>;

    /// Soft-deletes a link by setting `deleted_at = now()`.
    ///
    /// Returns `Ok(false)` if the link was not found or already deleted.
    async fn soft_delete(&self, id: i64) -> Result<bool, AppError>;

    /// Soft-deletes several links at once, optionally scoped to one owner.
    ///
    /// All-or-nothing: if any of `ids` is missing, already deleted, or owned
    /// by someone else, nothing is deleted and an empty list is returned.
    /// `ids` must not contain duplicates.
    async fn soft_delete_many(
        &self,
        ids: Vec<i64>,
        owner: Option<String>,
    ) -> Result<Vec<Link>, AppError>;

    /// Sets the active flag on several links, optionally scoped to one owner.
    ///
    /// Returns the updated rows as re-read after the write.
    async fn set_active_many(
        &self,
        ids: Vec<i64>,
        active: bool,
        owner: Option<String>,
    ) -> Result<Vec<Link>, AppError>;

    /// Returns one page of links matching `filter`, newest first, together
    /// with the total number of matches across all pages.
    async fn list(
        &self,
        filter: LinkFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Link>, i64), AppError>;

    /// Counts links and their clicks, optionally scoped to one owner.
    async fn stats(&self, owner: Option<String>) -> Result<LinkStats, AppError>;

    /// Returns active links whose expiry has passed but that the sweep has
    /// not deactivated yet.
    async fn find_expired(&self) -> Result<Vec<Link>, AppError>;

    /// Checks that the store answers a trivial query.
    async fn health_check(&self) -> Result<(), AppError>;

    /// Deactivates every active link whose expiry has passed.
    ///
    /// Returns the short codes that were deactivated.
    async fn deactivate_expired(&self) -> Result<Vec<String>, AppError>;
}
