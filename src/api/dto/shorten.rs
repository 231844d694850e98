//! DTOs for link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ErrorInfo;

/// Request to shorten one or more URLs.
///
/// Every link created from the batch is owned by `created_by`.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, max = 100))]
    #[validate(nested)]
    pub urls: Vec<UrlItem>,

    #[validate(length(min = 1, max = 64))]
    pub created_by: String,
}

/// Individual URL to be shortened.
///
/// The URL itself is checked per item by the service, so one bad URL fails
/// only its own item.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UrlItem {
    pub url: String,

    #[validate(length(max = 255))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Domain used for this link's short URL instead of the public one.
    #[validate(length(min = 1, max = 253))]
    pub domain: Option<String>,

    /// Overrides the default expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response containing batch processing results.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub summary: BatchSummary,
    pub items: Vec<ShortenResultItem>,
}

/// Individual result for a URL in the batch.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ShortenResultItem {
    Success {
        long_url: String,
        id: i64,
        code: String,
        short_url: String,
    },
    Error {
        long_url: String,
        error: ErrorInfo,
    },
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}
