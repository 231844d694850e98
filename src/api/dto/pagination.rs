//! Pagination and filtering query parameters.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::application::services::{ADMIN_ACTOR, DEFAULT_PAGE_SIZE};

/// Pagination query parameters.
///
/// Uses `serde_with` so numbers still parse when flattened into another
/// query struct. Out-of-range values are corrected by the service, not
/// rejected here.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// `(page, page_size)` with defaults applied.
    pub fn page_and_size(&self) -> (u32, u32) {
        (
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// Caller identity for read endpoints. Absent means the admin view.
#[derive(Debug, Default, Deserialize)]
pub struct ActorParams {
    pub actor: Option<String>,
}

impl ActorParams {
    pub fn actor(&self) -> &str {
        self.actor.as_deref().unwrap_or(ADMIN_ACTOR)
    }
}

/// Query parameters for `GET /api/links`.
#[derive(Debug, Deserialize)]
pub struct ListLinksParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    #[serde(flatten)]
    pub actor: ActorParams,

    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.page_and_size(), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(ActorParams::default().actor(), ADMIN_ACTOR);
    }

    #[test]
    fn test_flattened_numbers_parse_from_strings() {
        let json = r#"{"page": "3", "page_size": "50", "actor": "alice", "search": "docs"}"#;
        let params: ListLinksParams = serde_json::from_str(json).unwrap();

        assert_eq!(params.pagination.page_and_size(), (3, 50));
        assert_eq!(params.actor.actor(), "alice");
        assert_eq!(params.search.as_deref(), Some("docs"));
    }

    #[test]
    fn test_non_numeric_page_is_error() {
        let json = r#"{"page": "first"}"#;
        assert!(serde_json::from_str::<ListLinksParams>(json).is_err());
    }
}
