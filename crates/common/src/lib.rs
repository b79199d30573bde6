//! Common utilities and types shared across Gatekeeper components.

#![warn(clippy::pedantic)]

/// Module for wire types shared by the auth service and its callers
pub mod types;

/// Module for secret types that prevent accidental logging
pub mod secret;
