//! HTTP request handlers.

pub mod auth_handler;
pub mod health;

pub use auth_handler::AppState;
pub use health::{health_check, metrics_handler};
