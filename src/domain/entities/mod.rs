//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A shortened URL record, also the value held by the cache tiers
//!
//! # Design Pattern
//!
//! Entities follow the "New Type" pattern with separate structs for creation
//! and partial updates:
//! - [`NewLink`] - For creating new records
//! - [`LinkPatch`] - For partial updates
//!
//! [`LinkFilter`] and [`LinkStats`] carry listing filters and aggregate counts.

pub mod link;

pub use link::{Link, LinkFilter, LinkPatch, LinkStats, NewLink};

#[cfg(test)]
pub(crate) use link::sample_link;
