//! Handlers for link management endpoints.
//!
//! There is no authentication layer: the acting user is named in the request
//! (`actor` in bodies and query strings). The `admin` actor sees and changes
//! every link; any other actor is limited to the links it created.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::links::{
    BatchDeleteRequest, BatchDeleteResponse, BatchToggleRequest, BatchToggleResponse,
    LinkListResponse, LinkResponse, PageMeta, UpdateLinkRequest,
};
use crate::api::dto::pagination::{ActorParams, ListLinksParams};
use crate::domain::entities::{Link, LinkStats};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::state::AppState;

fn to_response<R: LinkRepository>(state: &AppState<R>, link: Link) -> LinkResponse {
    let short_url = state.link_service.short_url(&link);
    LinkResponse::new(link, short_url)
}

/// Lists links, newest first.
///
/// # Endpoint
///
/// `GET /api/links?page=1&page_size=20&search=docs&actor=alice`
///
/// `search` matches target, title, description and code case-insensitively.
/// Out-of-range paging falls back to page 1 and 20 items.
pub async fn list_links_handler<R: LinkRepository + 'static>(
    State(state): State<AppState<R>>,
    Query(params): Query<ListLinksParams>,
) -> Result<Json<LinkListResponse>, AppError> {
    let (page, page_size) = params.pagination.page_and_size();

    let page = state
        .link_service
        .list_links(page, page_size, params.search.as_deref(), params.actor.actor())
        .await?;

    let pagination = PageMeta::from(&page);
    let items = page
        .items
        .into_iter()
        .map(|link| to_response(&state, link))
        .collect();

    Ok(Json(LinkListResponse { items, pagination }))
}

/// Link and click totals.
///
/// # Endpoint
///
/// `GET /api/links/stats?actor=alice`
pub async fn link_stats_handler<R: LinkRepository + 'static>(
    State(state): State<AppState<R>>,
    Query(params): Query<ActorParams>,
) -> Result<Json<LinkStats>, AppError> {
    let stats = state.link_service.link_stats(params.actor()).await?;
    Ok(Json(stats))
}

/// Active links past their expiry, not yet deactivated by the sweep.
///
/// # Endpoint
///
/// `GET /api/links/expired`
pub async fn expired_links_handler<R: LinkRepository + 'static>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let links = state.link_service.expired_links().await?;
    Ok(Json(
        links
            .into_iter()
            .map(|link| to_response(&state, link))
            .collect(),
    ))
}

/// `GET /api/links/{id}`
pub async fn get_link_handler<R: LinkRepository + 'static>(
    Path(id): Path<i64>,
    State(state): State<AppState<R>>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_link(id).await?;
    Ok(Json(to_response(&state, link)))
}

/// Partially updates a link.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://new-destination.com",
///   "title": "New title",
///   "expires_at": "2027-12-31T23:59:59Z",
///   "is_active": true
/// }
/// ```
///
/// The cache is republished or invalidated before the response is sent.
///
/// # Errors
///
/// Returns 400 Bad Request for an empty body or an invalid URL.
/// Returns 404 Not Found if the link doesn't exist.
pub async fn update_link_handler<R: LinkRepository + 'static>(
    Path(id): Path<i64>,
    State(state): State<AppState<R>>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state.link_service.update_link(id, payload.into()).await?;
    Ok(Json(to_response(&state, link)))
}

/// Soft-deletes a link and drops it from every cache tier.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// # Errors
///
/// Returns 404 Not Found if the link doesn't exist or is already deleted.
pub async fn delete_link_handler<R: LinkRepository + 'static>(
    Path(id): Path<i64>,
    State(state): State<AppState<R>>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flips the active flag of a link.
///
/// # Endpoint
///
/// `POST /api/links/{id}/toggle`
pub async fn toggle_link_handler<R: LinkRepository + 'static>(
    Path(id): Path<i64>,
    State(state): State<AppState<R>>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.toggle_link(id).await?;
    Ok(Json(to_response(&state, link)))
}

/// Sets the active flag on several links.
///
/// # Endpoint
///
/// `POST /api/links/batch/toggle`
///
/// ```json
/// { "ids": [1, 2, 3], "active": false, "actor": "alice" }
/// ```
///
/// Links the actor does not own are skipped; `affected` counts the rest.
pub async fn batch_toggle_handler<R: LinkRepository + 'static>(
    State(state): State<AppState<R>>,
    Json(payload): Json<BatchToggleRequest>,
) -> Result<Json<BatchToggleResponse>, AppError> {
    payload.validate()?;

    let links = state
        .link_service
        .batch_toggle(payload.ids, payload.active, &payload.actor)
        .await?;

    Ok(Json(BatchToggleResponse {
        affected: links.len(),
        items: links
            .into_iter()
            .map(|link| to_response(&state, link))
            .collect(),
    }))
}

/// Soft-deletes several links.
///
/// # Endpoint
///
/// `POST /api/links/batch/delete`
///
/// ```json
/// { "ids": [1, 2, 3], "actor": "alice" }
/// ```
///
/// # Errors
///
/// Returns 404 Not Found, deleting nothing, if any id is missing or not
/// owned by the actor.
pub async fn batch_delete_handler<R: LinkRepository + 'static>(
    State(state): State<AppState<R>>,
    Json(payload): Json<BatchDeleteRequest>,
) -> Result<Json<BatchDeleteResponse>, AppError> {
    payload.validate()?;

    let deleted = state
        .link_service
        .delete_many(payload.ids, &payload.actor)
        .await?;

    Ok(Json(BatchDeleteResponse { deleted }))
}
