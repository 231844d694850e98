//! Domain layer containing business entities and repository contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic lives in services (see [`crate::application::services`])
//!
//! # Click Processing Flow
//!
//! 1. HTTP handler resolves a short code through the cache
//! 2. A click is registered on the cache manager (fire-and-forget)
//! 3. The aggregation job drains pending counters on a fixed interval
//! 4. Drained counts are applied via [`repositories::LinkRepository::apply_click_increment`]

pub mod entities;
pub mod repositories;
