//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::LinkPage;
use crate::domain::entities::{Link, LinkPatch};

/// JSON representation of a stored link.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub id: i64,
    pub code: String,
    pub long_url: String,
    pub short_url: String,
    pub title: String,
    pub description: String,
    pub custom_domain: Option<String>,
    pub click_count: i64,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn new(link: Link, short_url: String) -> Self {
        Self {
            id: link.id,
            code: link.code,
            long_url: link.long_url,
            short_url,
            title: link.title,
            description: link.description,
            custom_domain: link.custom_domain,
            click_count: link.click_count,
            is_active: link.is_active,
            expires_at: link.expires_at,
            created_by: link.created_by,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

/// Request body for `PATCH /api/links/{id}`.
///
/// All fields are optional; only provided fields are changed.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[validate(url(message = "Invalid URL format"))]
    pub url: Option<String>,

    #[validate(length(max = 255))]
    pub title: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,

    pub is_active: Option<bool>,
}

impl From<UpdateLinkRequest> for LinkPatch {
    fn from(req: UpdateLinkRequest) -> Self {
        LinkPatch {
            long_url: req.url,
            title: req.title,
            expires_at: req.expires_at,
            is_active: req.is_active,
        }
    }
}

/// Request body for `POST /api/links/batch/toggle`.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchToggleRequest {
    #[validate(length(min = 1, max = 100))]
    pub ids: Vec<i64>,

    pub active: bool,

    /// Non-admin actors only affect their own links.
    #[validate(length(min = 1, max = 64))]
    pub actor: String,
}

/// Request body for `POST /api/links/batch/delete`.
#[derive(Debug, Deserialize, Validate)]
pub struct BatchDeleteRequest {
    #[validate(length(min = 1, max = 100))]
    pub ids: Vec<i64>,

    #[validate(length(min = 1, max = 64))]
    pub actor: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchToggleResponse {
    pub affected: usize,
    pub items: Vec<LinkResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDeleteResponse {
    pub deleted: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl From<&LinkPage> for PageMeta {
    fn from(page: &LinkPage) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            total_pages: page.total_pages(),
        }
    }
}

/// Response for `GET /api/links`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkListResponse {
    pub items: Vec<LinkResponse>,
    pub pagination: PageMeta,
}
