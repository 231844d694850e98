//! Data Transfer Objects for HTTP requests and responses.

pub mod health;
pub mod links;
pub mod pagination;
pub mod shorten;
