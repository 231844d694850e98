//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Link, LinkFilter, LinkPatch, LinkStats, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, code, long_url, title, description, custom_domain, \
     click_count, is_active, expires_at, created_by, created_at, updated_at";

/// Owner and search predicates shared by the listing and its count. `$1` is
/// the owner, `$2` the ILIKE pattern.
const LIST_FILTER: &str = r#"
    deleted_at IS NULL
    AND ($1::text IS NULL OR created_by = $1)
    AND ($2::text IS NULL
         OR long_url ILIKE $2
         OR title ILIKE $2
         OR description ILIKE $2
         OR code ILIKE $2)
"#;

#[derive(FromRow)]
struct LinkRow {
    id: i64,
    code: String,
    long_url: String,
    title: String,
    description: String,
    custom_domain: Option<String>,
    click_count: i64,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LinkRow> for Link {
    fn from(r: LinkRow) -> Self {
        Link {
            id: r.id,
            code: r.code,
            long_url: r.long_url,
            title: r.title,
            description: r.description,
            custom_domain: r.custom_domain,
            click_count: r.click_count,
            is_active: r.is_active,
            expires_at: r.expires_at,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct StatsRow {
    total: i64,
    active: i64,
    total_clicks: i64,
}

/// Turns a search term into a substring pattern with LIKE wildcards escaped.
fn search_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// PostgreSQL repository for link storage and retrieval.
///
/// Soft-deleted rows (`deleted_at IS NOT NULL`) are filtered out of every
/// query. Uses SQLx bound parameters throughout.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<Link>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE {column} = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let sql = format!(
            r#"
            INSERT INTO links
                (code, long_url, title, description, custom_domain, expires_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&new_link.code)
            .bind(&new_link.long_url)
            .bind(&new_link.title)
            .bind(&new_link.description)
            .bind(&new_link.custom_domain)
            .bind(new_link.expires_at)
            .bind(&new_link.created_by)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        self.fetch_one_by("code", code).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<Link>, AppError> {
        self.fetch_one_by("long_url", long_url).await
    }

    async fn find_active_unexpired(&self) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE deleted_at IS NULL
              AND is_active
              AND (expires_at IS NULL OR expires_at > now())
            ORDER BY id
            "#
        );
        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn apply_click_increment(&self, code: &str, delta: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET click_count = click_count + $2
            WHERE code = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(code)
        .bind(delta)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE links
            SET long_url = COALESCE($2, long_url),
                title = COALESCE($3, title),
                expires_at = COALESCE($4, expires_at),
                is_active = COALESCE($5, is_active),
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(patch.long_url)
        .bind(patch.title)
        .bind(patch.expires_at)
        .bind(patch.is_active)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE links SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete_many(
        &self,
        ids: Vec<i64>,
        owner: Option<String>,
    ) -> Result<Vec<Link>, AppError> {
        // All-or-nothing: the update only runs when every requested id matched.
        let sql = format!(
            r#"
            WITH targets AS (
                SELECT id FROM links
                WHERE id = ANY($1)
                  AND deleted_at IS NULL
                  AND ($2::text IS NULL OR created_by = $2)
            )
            UPDATE links
            SET deleted_at = now()
            WHERE id IN (SELECT id FROM targets)
              AND (SELECT COUNT(*) FROM targets) = cardinality($1::bigint[])
            RETURNING {LINK_COLUMNS}
            "#
        );
        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&ids)
            .bind(owner)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn set_active_many(
        &self,
        ids: Vec<i64>,
        active: bool,
        owner: Option<String>,
    ) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET is_active = $2, updated_at = now()
            WHERE id = ANY($1)
              AND deleted_at IS NULL
              AND ($3::text IS NULL OR created_by = $3)
            RETURNING {LINK_COLUMNS}
            "#
        );
        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&ids)
            .bind(active)
            .bind(owner)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn list(
        &self,
        filter: LinkFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Link>, i64), AppError> {
        let pattern = filter.search.as_deref().map(search_pattern);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM links WHERE {LIST_FILTER}"
        ))
        .bind(&filter.owner)
        .bind(&pattern)
        .fetch_one(self.pool.as_ref())
        .await?;

        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE {LIST_FILTER}
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&filter.owner)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok((rows.into_iter().map(Link::from).collect(), total))
    }

    async fn stats(&self, owner: Option<String>) -> Result<LinkStats, AppError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (
                       WHERE is_active AND (expires_at IS NULL OR expires_at > now())
                   ) AS active,
                   COALESCE(SUM(click_count), 0)::bigint AS total_clicks
            FROM links
            WHERE deleted_at IS NULL
              AND ($1::text IS NULL OR created_by = $1)
            "#,
        )
        .bind(owner)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(LinkStats {
            total: row.total,
            active: row.active,
            total_clicks: row.total_clicks,
        })
    }

    async fn find_expired(&self) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE deleted_at IS NULL
              AND is_active
              AND expires_at IS NOT NULL
              AND expires_at <= now()
            ORDER BY expires_at
            "#
        );
        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await?;
        Ok(())
    }

    async fn deactivate_expired(&self) -> Result<Vec<String>, AppError> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE links
            SET is_active = FALSE, updated_at = now()
            WHERE deleted_at IS NULL
              AND is_active
              AND expires_at IS NOT NULL
              AND expires_at <= now()
            RETURNING code
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(codes)
    }
}
