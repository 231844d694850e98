//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::code_generator::is_well_formed;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Reject codes that cannot name a link
/// 2. Resolve through the cache, falling back to the record store
/// 3. Register the click (fire-and-forget)
/// 4. Return 302 Found
///
/// Cache faults never fail the request; at worst the lookup goes to the
/// record store.
///
/// # Errors
///
/// Returns 404 Not Found if the code is unknown, inactive or expired.
/// Returns 500 if the record store fails on a cache miss.
pub async fn redirect_handler<R: LinkRepository + 'static>(
    Path(code): Path<String>,
    State(state): State<AppState<R>>,
) -> Result<Response, AppError> {
    if !is_well_formed(&code) {
        return Err(not_found(&code));
    }

    let link = state
        .link_service
        .resolve(&code)
        .await?
        .ok_or_else(|| not_found(&code))?;

    // Not awaited: the response never waits on click bookkeeping.
    drop(state.link_service.register_click(&code));

    debug!("Redirect {} -> {}", code, link.long_url);
    Ok((StatusCode::FOUND, [(header::LOCATION, link.long_url)]).into_response())
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "code": code }))
}
