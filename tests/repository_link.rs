use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use shortlink::domain::entities::{LinkFilter, LinkPatch, NewLink};
use shortlink::domain::repositories::LinkRepository;
use shortlink::infrastructure::persistence::PgLinkRepository;

fn new_link(code: &str, url: &str, owner: &str) -> NewLink {
    NewLink {
        code: code.to_string(),
        long_url: url.to_string(),
        title: String::new(),
        description: String::new(),
        custom_domain: None,
        expires_at: None,
        created_by: owner.to_string(),
    }
}

async fn insert_expired(pool: &PgPool, code: &str) {
    sqlx::query(
        "INSERT INTO links (code, long_url, expires_at) VALUES ($1, $2, now() - INTERVAL '1 hour')",
    )
    .bind(code)
    .bind(format!("https://example.com/{code}"))
    .execute(pool)
    .await
    .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_find(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo
        .create(new_link("abc123", "https://example.com", "alice"))
        .await
        .unwrap();

    assert_eq!(link.code, "abc123");
    assert!(link.is_active);
    assert_eq!(link.click_count, 0);

    let by_code = repo.find_by_code("abc123").await.unwrap().unwrap();
    assert_eq!(by_code.id, link.id);
    let by_url = repo
        .find_by_long_url("https://example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_url.id, link.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_code_is_conflict(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("abc123", "https://example.com/1", "alice"))
        .await
        .unwrap();

    let result = repo
        .create(new_link("abc123", "https://example.com/2", "alice"))
        .await;

    assert!(matches!(result, Err(shortlink::AppError::Conflict { .. })));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_soft_delete_hides_row_and_frees_code(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let link = repo
        .create(new_link("abc123", "https://example.com", "alice"))
        .await
        .unwrap();

    assert!(repo.soft_delete(link.id).await.unwrap());
    assert!(!repo.soft_delete(link.id).await.unwrap());
    assert!(repo.find_by_code("abc123").await.unwrap().is_none());

    let reused = repo
        .create(new_link("abc123", "https://example.com", "alice"))
        .await
        .unwrap();
    assert_ne!(reused.id, link.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_click_increment(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("abc123", "https://example.com", "alice"))
        .await
        .unwrap();

    assert!(repo.apply_click_increment("abc123", 5).await.unwrap());
    assert!(repo.apply_click_increment("abc123", 2).await.unwrap());
    assert!(!repo.apply_click_increment("nope11", 1).await.unwrap());

    let link = repo.find_by_code("abc123").await.unwrap().unwrap();
    assert_eq!(link.click_count, 7);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_partial_update(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let link = repo
        .create(new_link("abc123", "https://example.com", "alice"))
        .await
        .unwrap();

    let patch = LinkPatch {
        title: Some("Docs".to_string()),
        ..Default::default()
    };
    assert!(repo.update(link.id, patch).await.unwrap());

    let updated = repo.find_by_id(link.id).await.unwrap().unwrap();
    assert_eq!(updated.title, "Docs");
    assert_eq!(updated.long_url, "https://example.com");
    assert!(updated.updated_at >= link.updated_at);

    assert!(!repo.update(9999, LinkPatch::default()).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_soft_delete_many_respects_owner(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let mine = repo
        .create(new_link("mine11", "https://example.com/1", "alice"))
        .await
        .unwrap();
    let theirs = repo
        .create(new_link("their1", "https://example.com/2", "bob"))
        .await
        .unwrap();

    let none = repo
        .soft_delete_many(vec![mine.id, theirs.id], Some("alice".to_string()))
        .await
        .unwrap();
    assert!(none.is_empty());
    assert!(repo.find_by_id(mine.id).await.unwrap().is_some());

    let all = repo
        .soft_delete_many(vec![mine.id, theirs.id], None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_set_active_many(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let mine = repo
        .create(new_link("mine11", "https://example.com/1", "alice"))
        .await
        .unwrap();
    let theirs = repo
        .create(new_link("their1", "https://example.com/2", "bob"))
        .await
        .unwrap();

    let changed = repo
        .set_active_many(vec![mine.id, theirs.id], false, Some("alice".to_string()))
        .await
        .unwrap();

    assert_eq!(changed.len(), 1);
    assert!(!changed[0].is_active);
    assert!(repo.find_by_id(theirs.id).await.unwrap().unwrap().is_active);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_deactivate_expired_and_active_listing(pool: PgPool) {
    insert_expired(&pool, "old111").await;
    let repo = PgLinkRepository::new(Arc::new(pool));
    let mut live = new_link("live11", "https://example.com/live", "alice");
    live.expires_at = Some(Utc::now() + Duration::days(1));
    repo.create(live).await.unwrap();

    let active = repo.find_active_unexpired().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].code, "live11");

    assert_eq!(repo.deactivate_expired().await.unwrap(), vec!["old111"]);
    assert!(repo.deactivate_expired().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_health_check(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    assert!(repo.health_check().await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_list_filters_and_pages(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    for i in 0..5 {
        repo.create(new_link(
            &format!("alice{i}"),
            &format!("https://docs.example.com/{i}"),
            "alice",
        ))
        .await
        .unwrap();
    }
    repo.create(new_link("bob001", "https://blog.example.com", "bob"))
        .await
        .unwrap();

    let (page, total) = repo
        .list(
            LinkFilter {
                owner: Some("alice".to_string()),
                search: None,
            },
            0,
            2,
        )
        .await
        .unwrap();
    assert_eq!(total, 5);
    assert_eq!(page.len(), 2);
    assert!(page[0].created_at >= page[1].created_at);

    let (found, total) = repo
        .list(
            LinkFilter {
                owner: None,
                search: Some("BLOG".to_string()),
            },
            0,
            20,
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].code, "bob001");

    // Wildcards in the term match literally.
    let (none, total) = repo
        .list(
            LinkFilter {
                owner: None,
                search: Some("%".to_string()),
            },
            0,
            20,
        )
        .await
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(total, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_stats_and_expired(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));
    repo.create(new_link("live01", "https://example.com/live", "alice"))
        .await
        .unwrap();
    repo.apply_click_increment("live01", 7).await.unwrap();
    insert_expired(&pool, "old001").await;

    let all = repo.stats(None).await.unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.active, 1);
    assert_eq!(all.total_clicks, 7);

    let alice = repo.stats(Some("alice".to_string())).await.unwrap();
    assert_eq!(alice.total, 1);

    let expired = repo.find_expired().await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].code, "old001");

    repo.deactivate_expired().await.unwrap();
    assert!(repo.find_expired().await.unwrap().is_empty());
}
