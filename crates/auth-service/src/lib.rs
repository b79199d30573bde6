//! Auth Service Library
//!
//! Account registration with deferred email confirmation, password sign-in,
//! and stateless HS256 access/refresh token pairs.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Password hashing, confirmation tokens, JWT signing
//! - `errors` - Error types and the response envelope
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics and the delegated authorization gate
//! - `models` - Data models
//! - `observability` - Metrics and log correlation helpers
//! - `repositories` - Account store adapter
//! - `routes` - Router assembly
//! - `services` - Registration, sessions, token issuing, notifications

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
