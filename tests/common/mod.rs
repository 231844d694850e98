#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use shortlink::application::services::{LinkService, LinkSettings};
use shortlink::domain::entities::{Link, LinkFilter, LinkPatch, LinkStats, NewLink};
use shortlink::domain::repositories::LinkRepository;
use shortlink::error::AppError;
use shortlink::infrastructure::cache::{
    CacheError, CacheManager, CacheResult, CounterTier, RecordTier,
};
use shortlink::state::AppState;

pub const TTL: Duration = Duration::from_secs(3600);

/// Row as stored by [`InMemoryLinkRepository`].
#[derive(Debug, Clone)]
struct StoredLink {
    link: Link,
    deleted: bool,
}

/// Record store double with the same filtering rules as the Postgres one.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    rows: Mutex<Vec<StoredLink>>,
    next_id: Mutex<i64>,
    unhealthy: AtomicBool,
    failing_codes: Mutex<Vec<String>>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a link directly, bypassing the service.
    pub fn insert(&self, code: &str, long_url: &str) -> Link {
        self.insert_with(code, long_url, |_| {})
    }

    pub fn insert_with(&self, code: &str, long_url: &str, edit: impl FnOnce(&mut Link)) -> Link {
        let mut next_id = self.next_id.lock();
        *next_id += 1;

        let now = Utc::now();
        let mut link = Link {
            id: *next_id,
            code: code.to_string(),
            long_url: long_url.to_string(),
            title: String::new(),
            description: String::new(),
            custom_domain: None,
            click_count: 0,
            is_active: true,
            expires_at: None,
            created_by: "admin".to_string(),
            created_at: now,
            updated_at: now,
        };
        edit(&mut link);

        self.rows.lock().push(StoredLink {
            link: link.clone(),
            deleted: false,
        });
        link
    }

    pub fn click_count(&self, code: &str) -> i64 {
        self.find_live(|l| l.code == code)
            .map(|l| l.click_count)
            .unwrap_or(0)
    }

    pub fn find_by_code_sync(&self, code: &str) -> Option<Link> {
        self.find_live(|l| l.code == code)
    }

    pub fn is_deleted(&self, id: i64) -> bool {
        self.rows
            .lock()
            .iter()
            .any(|r| r.link.id == id && r.deleted)
    }

    /// Makes `health_check` fail.
    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }

    /// Makes `apply_click_increment` fail for `code`.
    pub fn fail_increments_for(&self, code: &str) {
        self.failing_codes.lock().push(code.to_string());
    }

    fn find_live(&self, pred: impl Fn(&Link) -> bool) -> Option<Link> {
        self.rows
            .lock()
            .iter()
            .find(|r| !r.deleted && pred(&r.link))
            .map(|r| r.link.clone())
    }
}

fn in_scope(link: &Link, owner: &Option<String>) -> bool {
    owner.as_deref().is_none_or(|o| link.created_by == o)
}

fn matches_search(link: &Link, term: &str) -> bool {
    let term = term.to_lowercase();
    [&link.long_url, &link.title, &link.description, &link.code]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

fn touch(link: &mut Link, now: DateTime<Utc>) {
    link.updated_at = now;
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        if self.find_live(|l| l.code == new_link.code).is_some() {
            return Err(AppError::conflict(
                "Resource already exists",
                serde_json::json!({ "code": new_link.code }),
            ));
        }

        Ok(self.insert_with(&new_link.code, &new_link.long_url, |link| {
            link.title = new_link.title;
            link.description = new_link.description;
            link.custom_domain = new_link.custom_domain;
            link.expires_at = new_link.expires_at;
            link.created_by = new_link.created_by;
        }))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(self.find_live(|l| l.code == code))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self.find_live(|l| l.id == id))
    }

    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<Link>, AppError> {
        Ok(self.find_live(|l| l.long_url == long_url))
    }

    async fn find_active_unexpired(&self) -> Result<Vec<Link>, AppError> {
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|r| !r.deleted && r.link.is_live())
            .map(|r| r.link.clone())
            .collect())
    }

    async fn apply_click_increment(&self, code: &str, delta: i64) -> Result<bool, AppError> {
        if self.failing_codes.lock().iter().any(|c| c == code) {
            return Err(AppError::internal(
                "Database error",
                serde_json::json!({ "code": code }),
            ));
        }

        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|r| !r.deleted && r.link.code == code) {
            Some(row) => {
                row.link.click_count += delta;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<bool, AppError> {
        let mut rows = self.rows.lock();
        let Some(row) = rows.iter_mut().find(|r| !r.deleted && r.link.id == id) else {
            return Ok(false);
        };

        let link = &mut row.link;
        if let Some(long_url) = patch.long_url {
            link.long_url = long_url;
        }
        if let Some(title) = patch.title {
            link.title = title;
        }
        if let Some(expires_at) = patch.expires_at {
            link.expires_at = Some(expires_at);
        }
        if let Some(is_active) = patch.is_active {
            link.is_active = is_active;
        }
        touch(link, Utc::now());
        Ok(true)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|r| !r.deleted && r.link.id == id) {
            Some(row) => {
                row.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete_many(
        &self,
        ids: Vec<i64>,
        owner: Option<String>,
    ) -> Result<Vec<Link>, AppError> {
        let mut rows = self.rows.lock();
        let targets = rows
            .iter()
            .filter(|r| !r.deleted && ids.contains(&r.link.id) && in_scope(&r.link, &owner))
            .count();
        if targets != ids.len() {
            return Ok(Vec::new());
        }

        let mut deleted = Vec::new();
        for row in rows.iter_mut().filter(|r| !r.deleted && ids.contains(&r.link.id)) {
            row.deleted = true;
            deleted.push(row.link.clone());
        }
        Ok(deleted)
    }

    async fn set_active_many(
        &self,
        ids: Vec<i64>,
        active: bool,
        owner: Option<String>,
    ) -> Result<Vec<Link>, AppError> {
        let now = Utc::now();
        let mut rows = self.rows.lock();
        let mut changed = Vec::new();

        for row in rows
            .iter_mut()
            .filter(|r| !r.deleted && ids.contains(&r.link.id) && in_scope(&r.link, &owner))
        {
            row.link.is_active = active;
            touch(&mut row.link, now);
            changed.push(row.link.clone());
        }
        Ok(changed)
    }

    async fn list(
        &self,
        filter: LinkFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Link>, i64), AppError> {
        let mut matched: Vec<Link> = self
            .rows
            .lock()
            .iter()
            .filter(|r| !r.deleted && in_scope(&r.link, &filter.owner))
            .filter(|r| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|term| matches_search(&r.link, term))
            })
            .map(|r| r.link.clone())
            .collect();

        matched.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn stats(&self, owner: Option<String>) -> Result<LinkStats, AppError> {
        let rows = self.rows.lock();
        let scoped: Vec<&Link> = rows
            .iter()
            .filter(|r| !r.deleted && in_scope(&r.link, &owner))
            .map(|r| &r.link)
            .collect();

        Ok(LinkStats {
            total: scoped.len() as i64,
            active: scoped.iter().filter(|l| l.is_live()).count() as i64,
            total_clicks: scoped.iter().map(|l| l.click_count).sum(),
        })
    }

    async fn find_expired(&self) -> Result<Vec<Link>, AppError> {
        let now = Utc::now();
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|r| {
                !r.deleted && r.link.is_active && r.link.expires_at.is_some_and(|e| e <= now)
            })
            .map(|r| r.link.clone())
            .collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(AppError::internal(
                "Database error",
                serde_json::json!({ "reason": "connection refused" }),
            ));
        }
        Ok(())
    }

    async fn deactivate_expired(&self) -> Result<Vec<String>, AppError> {
        let now = Utc::now();
        let mut rows = self.rows.lock();
        let mut codes = Vec::new();

        for row in rows.iter_mut().filter(|r| {
            !r.deleted && r.link.is_active && r.link.expires_at.is_some_and(|e| e <= now)
        }) {
            row.link.is_active = false;
            touch(&mut row.link, now);
            codes.push(row.link.code.clone());
        }
        Ok(codes)
    }
}

/// Remote tier double that can be taken down and brought back.
#[derive(Default)]
pub struct FlakyRemote {
    records: Mutex<HashMap<String, Link>>,
    counters: Mutex<HashMap<String, u64>>,
    down: AtomicBool,
}

impl FlakyRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn has_record(&self, code: &str) -> bool {
        self.records.lock().contains_key(code)
    }

    pub fn pending(&self, code: &str) -> u64 {
        self.counters.lock().get(code).copied().unwrap_or(0)
    }

    fn check(&self) -> CacheResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CacheError::Timeout(500));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordTier for FlakyRemote {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn get(&self, code: &str) -> CacheResult<Option<Link>> {
        self.check()?;
        Ok(self.records.lock().get(code).cloned())
    }

    async fn set(&self, code: &str, link: &Link) -> CacheResult<()> {
        self.check()?;
        self.records.lock().insert(code.to_string(), link.clone());
        Ok(())
    }

    async fn delete(&self, code: &str) -> CacheResult<()> {
        self.check()?;
        self.records.lock().remove(code);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.check().is_ok()
    }
}

#[async_trait]
impl CounterTier for FlakyRemote {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn increment(&self, code: &str) -> CacheResult<()> {
        self.check()?;
        *self.counters.lock().entry(code.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn drain(&self) -> CacheResult<HashMap<String, u64>> {
        self.check()?;
        Ok(std::mem::take(&mut *self.counters.lock()))
    }

    async fn clear(&self) -> CacheResult<()> {
        self.check()?;
        self.counters.lock().clear();
        Ok(())
    }
}

pub fn memory_cache() -> Arc<CacheManager> {
    Arc::new(CacheManager::memory_only(TTL, 100))
}

pub fn remote_cache(remote: Arc<FlakyRemote>) -> Arc<CacheManager> {
    Arc::new(CacheManager::with_remote(TTL, 100, remote))
}

pub fn create_test_service(
    repository: Arc<InMemoryLinkRepository>,
    cache: Arc<CacheManager>,
) -> Arc<LinkService<InMemoryLinkRepository>> {
    Arc::new(LinkService::new(repository, cache, LinkSettings::default()))
}

pub fn create_test_state(
    repository: Arc<InMemoryLinkRepository>,
    cache: Arc<CacheManager>,
) -> AppState<InMemoryLinkRepository> {
    AppState::new(create_test_service(repository, cache))
}
