//! Business logic services for the application layer.

pub mod link_service;

pub use link_service::{
    ADMIN_ACTOR, CreateLink, DEFAULT_PAGE_SIZE, LinkPage, LinkService, LinkSettings, MAX_PAGE_SIZE,
};
