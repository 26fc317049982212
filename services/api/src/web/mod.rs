pub mod auth;
pub mod books;
pub mod catalog;
pub mod library;
pub mod middleware;
pub mod progress;
pub mod ratings;
pub mod respond;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use rest::{index_handler, ApiDoc};
