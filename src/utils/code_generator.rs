//! Short code derivation and shape checks.
//!
//! Codes are derived from the target URL rather than drawn at random, so the
//! same URL always maps to the same code.

use sha2::{Digest, Sha256};

/// Length of a derived short code.
pub const CODE_LENGTH: usize = 6;

/// Longest code accepted on the redirect path.
pub const MAX_CODE_LENGTH: usize = 32;

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Codes that would shadow system routes.
const RESERVED_CODES: &[&str] = &["health"];

/// Derives the short code for a target URL.
///
/// Takes the first 8 bytes of the SHA-256 digest as a big-endian integer and
/// writes its lowest [`CODE_LENGTH`] base62 digits, most significant first.
///
/// # Examples
///
/// ```ignore
/// let code = code_for_url("https://example.com/");
/// assert_eq!(code.len(), 6);
/// assert_eq!(code, code_for_url("https://example.com/"));
/// ```
pub fn code_for_url(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let mut num = u64::from_be_bytes(prefix);

    let mut code = [0u8; CODE_LENGTH];
    for slot in code.iter_mut().rev() {
        *slot = BASE62[(num % 62) as usize];
        num /= 62;
    }

    code.iter().map(|&b| b as char).collect()
}

/// Returns true if `code` could name a link: non-empty, at most
/// [`MAX_CODE_LENGTH`] characters, ASCII alphanumeric, not reserved.
///
/// Used to reject junk paths before they reach the cache.
pub fn is_well_formed(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && code.bytes().all(|b| b.is_ascii_alphanumeric())
        && !RESERVED_CODES.contains(&code)
}
