//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`  - Health check: database and cache tiers
//! - `GET  /{code}`  - Short link redirect
//! - `/api/*`        - Link management (see [`api_routes`])
//!
//! Every request is wrapped in a tracing span (see
//! [`crate::api::middleware::tracing`]).

use crate::api::handlers::{
    batch_delete_handler, batch_toggle_handler, delete_link_handler, expired_links_handler,
    get_link_handler, health_handler, link_stats_handler, list_links_handler, redirect_handler,
    shorten_handler, toggle_link_handler, update_link_handler,
};
use crate::api::middleware::tracing;
use crate::domain::repositories::LinkRepository;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};

/// Constructs the application router with all routes and middleware.
pub fn app_router<R: LinkRepository + 'static>(state: AppState<R>) -> Router {
    Router::new()
        .route("/health", get(health_handler::<R>))
        .route("/{code}", get(redirect_handler::<R>))
        .nest("/api", api_routes::<R>())
        .with_state(state)
        .layer(tracing::layer())
}

/// Link management routes, mounted under `/api`.
///
/// - `POST   /shorten`             - Create links (batch)
/// - `GET    /links`               - List, paged and searchable
/// - `GET    /links/stats`         - Link and click totals
/// - `GET    /links/expired`       - Expired links not yet swept
/// - `POST   /links/batch/toggle`  - Set active flag on several links
/// - `POST   /links/batch/delete`  - Soft-delete several links
/// - `GET    /links/{id}`          - Fetch one link
/// - `PATCH  /links/{id}`          - Partial update
/// - `DELETE /links/{id}`          - Soft delete
/// - `POST   /links/{id}/toggle`   - Flip active flag
pub fn api_routes<R: LinkRepository + 'static>() -> Router<AppState<R>> {
    Router::new()
        .route("/shorten", post(shorten_handler::<R>))
        .route("/links", get(list_links_handler::<R>))
        .route("/links/stats", get(link_stats_handler::<R>))
        .route("/links/expired", get(expired_links_handler::<R>))
        .route("/links/batch/toggle", post(batch_toggle_handler::<R>))
        .route("/links/batch/delete", post(batch_delete_handler::<R>))
        .route(
            "/links/{id}",
            get(get_link_handler::<R>)
                .patch(update_link_handler::<R>)
                .delete(delete_link_handler::<R>),
        )
        .route("/links/{id}/toggle", post(toggle_link_handler::<R>))
}
