//! Utility functions for short code derivation and URL validation.
//!
//! - [`code_generator`] - Deterministic short codes and code shape checks
//! - [`url_normalizer`] - Target URL validation and normalization

pub mod code_generator;
pub mod url_normalizer;
