//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened URL record as persisted in the record store.
///
/// This is also the value held by both cache tiers. A cached `Link` is a
/// snapshot: it is replaced wholesale by the write path and never mutated
/// in place, so it may lag the database until the next publish or invalidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub code: String,
    pub long_url: String,
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

impl Link {
    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() >= e)
    }

    /// Returns true if the link may be served by the redirect path.
    pub fn is_live(&self) -> bool {
        self.is_active && !self.is_expired()
    }

    /// Builds the public short URL, preferring the link's own domain.
    pub fn full_url(&self, default_domain: &str) -> String {
        let domain = self.custom_domain.as_deref().unwrap_or(default_domain);
        format!("https://{}/{}", domain.trim_end_matches('/'), self.code)
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub code: String,
    pub long_url: String,
    pub title: String,
    pub description: String,
    pub custom_domain: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: String,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub long_url: Option<String>,
    pub title: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl LinkPatch {
    /// Returns true if the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.long_url.is_none()
            && self.title.is_none()
            && self.expires_at.is_none()
            && self.is_active.is_none()
    }
}

/// Filter for link listings. `None` fields do not restrict the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFilter {
    /// Case-insensitive substring matched against target, title,
    /// description and code.
    pub search: Option<String>,
    /// Only links created by this actor.
    pub owner: Option<String>,
}

/// Aggregate counts over non-deleted links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStats {
    pub total: i64,
    /// Active and not expired.
    pub active: i64,
    pub total_clicks: i64,
}

#[cfg(test)]
pub(crate) fn sample_link(code: &str) -> Link {
    let now = Utc::now();
    Link {
        id: 1,
        code: code.to_string(),
        long_url: format!("https://example.com/{code}"),
        title: String::new(),
        description: String::new(),
        custom_domain: None,
        click_count: 0,
        is_active: true,
        expires_at: None,
        created_by: "admin".to_string(),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_link_without_expiry_is_live() {
        let link = sample_link("abc123");

        assert!(!link.is_expired());
        assert!(link.is_live());
    }

    #[test]
    fn test_link_is_expired() {
        let mut link = sample_link("abc123");
        link.expires_at = Some(Utc::now() - Duration::seconds(1));

        assert!(link.is_expired());
        assert!(!link.is_live());
    }

    #[test]
    fn test_inactive_link_is_not_live() {
        let mut link = sample_link("abc123");
        link.is_active = false;

        assert!(!link.is_expired());
        assert!(!link.is_live());
    }

    #[test]
    fn test_full_url_prefers_custom_domain() {
        let mut link = sample_link("abc123");
        assert_eq!(link.full_url("s.example.com/"), "https://s.example.com/abc123");

        link.custom_domain = Some("go.acme.io".to_string());
        assert_eq!(link.full_url("s.example.com"), "https://go.acme.io/abc123");
    }

    #[test]
    fn test_link_json_snapshot_roundtrip() {
        let mut link = sample_link("xyz789");
        link.expires_at = Some(Utc::now() + Duration::hours(1));

        let json = serde_json::to_string(&link).unwrap();
        let restored: Link = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, link);
    }

    #[test]
    fn test_empty_patch() {
        assert!(LinkPatch::default().is_empty());

        let patch = LinkPatch {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
