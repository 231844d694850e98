//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::domain::repositories::LinkRepository;
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: healthy, or degraded because the remote cache tier stopped
///   answering (redirects keep working from the local tier)
/// - **503 Service Unavailable**: the record store is unreachable
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected" },
///     "cache": { "status": "ok", "message": "redis: PING ok, 42 local entries" }
///   }
/// }
/// ```
pub async fn health_handler<R: LinkRepository + 'static>(
    State(state): State<AppState<R>>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = check_database(&state).await;
    let cache = check_cache(&state).await;

    let (status, code) = match (database.is_ok(), cache.is_ok()) {
        (false, _) => ("unhealthy", StatusCode::SERVICE_UNAVAILABLE),
        (true, false) => ("degraded", StatusCode::OK),
        (true, true) => ("healthy", StatusCode::OK),
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { database, cache },
    };

    (code, Json(response))
}

async fn check_database<R: LinkRepository>(state: &AppState<R>) -> CheckStatus {
    match state.link_service.repository().health_check().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

/// Reports the selected tiers; PINGs the remote tier when there is one.
async fn check_cache<R: LinkRepository>(state: &AppState<R>) -> CheckStatus {
    let entries = state.cache.local().len();

    match (state.cache.remote_name(), state.cache.remote_healthy().await) {
        (Some(name), Some(true)) => {
            CheckStatus::ok(format!("{}: PING ok, {} local entries", name, entries))
        }
        (Some(name), _) => CheckStatus::error(format!(
            "{}: not responding, serving from local tier ({} entries)",
            name, entries
        )),
        (None, _) => CheckStatus::ok(format!("memory-only, {} local entries", entries)),
    }
}
