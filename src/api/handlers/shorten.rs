//! Handler for link shortening endpoint.

use axum::{Json, extract::State};
use validator::Validate;

use crate::api::dto::shorten::{
    BatchSummary, ShortenRequest, ShortenResponse, ShortenResultItem, UrlItem,
};
use crate::application::services::CreateLink;
use crate::domain::entities::Link;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::state::AppState;

/// Creates short links for one or more long URLs.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "created_by": "alice",
///   "urls": [
///     {
///       "url": "https://example.com",
///       "title": "Example",                    // optional
///       "domain": "s.example.com",             // optional
///       "expires_at": "2027-01-01T00:00:00Z"   // optional
///     }
///   ]
/// }
/// ```
///
/// # Batch Processing
///
/// Items are processed independently. A rejected or duplicate URL fails only
/// its own item and the error is reported in `items`.
///
/// # Errors
///
/// Returns 400 Bad Request if the request as a whole fails validation.
pub async fn shorten_handler<R: LinkRepository + 'static>(
    State(state): State<AppState<R>>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let total = payload.urls.len();
    let mut items = Vec::with_capacity(total);
    let mut successful = 0;

    for item in payload.urls {
        let long_url = item.url.clone();

        match process_single_url(&state, item, &payload.created_by).await {
            Ok(link) => {
                successful += 1;
                items.push(ShortenResultItem::Success {
                    short_url: state.link_service.short_url(&link),
                    long_url: link.long_url,
                    id: link.id,
                    code: link.code,
                });
            }
            Err(err) => items.push(ShortenResultItem::Error {
                long_url,
                error: err.to_error_info(),
            }),
        }
    }

    Ok(Json(ShortenResponse {
        summary: BatchSummary {
            total,
            successful,
            failed: total - successful,
        },
        items,
    }))
}

async fn process_single_url<R: LinkRepository>(
    state: &AppState<R>,
    item: UrlItem,
    created_by: &str,
) -> Result<Link, AppError> {
    state
        .link_service
        .create_link(CreateLink {
            long_url: item.url,
            title: item.title.unwrap_or_default(),
            description: item.description.unwrap_or_default(),
            custom_domain: item.domain,
            expires_at: item.expires_at,
            created_by: created_by.to_string(),
        })
        .await
}
