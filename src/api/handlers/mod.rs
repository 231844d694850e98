//! HTTP request handlers.

pub mod health;
pub mod links;
pub mod redirect;
pub mod shorten;

pub use health::health_handler;
pub use links::{
    batch_delete_handler, batch_toggle_handler, delete_link_handler, expired_links_handler,
    get_link_handler, link_stats_handler, list_links_handler, toggle_link_handler,
    update_link_handler,
};
pub use redirect::redirect_handler;
pub use shorten::shorten_handler;
