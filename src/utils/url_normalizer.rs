//! Target URL validation and normalization.
//!
//! Rejects targets a short link must never point at and brings the rest to a
//! canonical form, so duplicate detection compares like with like.

use url::{Host, Url};

/// Errors that can occur while validating a target URL.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UrlValidationError {
    #[error("URL must not be empty")]
    Empty,

    #[error("URL must not exceed {max} characters")]
    TooLong { max: usize },

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must contain a host")]
    MissingHost,

    #[error("Local addresses are not allowed")]
    LocalAddress,
}

/// Validates a target URL and returns its normalized form.
///
/// # Rules
///
/// 1. Non-empty after trimming, at most `max_len` bytes
/// 2. Scheme is `http` or `https`
/// 3. Has a host, which must not be `localhost` or a loopback address
/// 4. Host is lowercased and default ports are dropped; path, query and
///    fragment are preserved
///
/// # Errors
///
/// Returns the first [`UrlValidationError`] rule that fails.
pub fn normalize_url(input: &str, max_len: usize) -> Result<String, UrlValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    if input.len() > max_len {
        return Err(UrlValidationError::TooLong { max: max_len });
    }

    // The url crate lowercases hosts and drops default ports while parsing.
    let url = Url::parse(input).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    match url.host() {
        None => return Err(UrlValidationError::MissingHost),
        Some(Host::Domain(domain)) if domain.is_empty() => {
            return Err(UrlValidationError::MissingHost);
        }
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.');
            if domain == "localhost" || domain.ends_with(".localhost") {
                return Err(UrlValidationError::LocalAddress);
            }
        }
        Some(Host::Ipv4(ip)) if ip.is_loopback() || ip.is_unspecified() => {
            return Err(UrlValidationError::LocalAddress);
        }
        Some(Host::Ipv6(ip)) if ip.is_loopback() || ip.is_unspecified() => {
            return Err(UrlValidationError::LocalAddress);
        }
        Some(_) => {}
    }

    Ok(url.to_string())
}
