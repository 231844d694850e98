//! Application layer: services and background jobs.
//!
//! Services consume repository traits and the cache manager and give HTTP
//! handlers a small API. Jobs run beside the HTTP server for the process
//! lifetime.
//!
//! - [`services::LinkService`] - link lifecycle and cache write-through
//! - [`jobs::ClickAggregator`] - periodic click count aggregation
//! - [`jobs::ExpirySweeper`] - periodic expiry sweep

pub mod jobs;
pub mod services;
