//! # Auth Test Utilities
//!
//! Shared test utilities for the auth service.
//!
//! This crate provides:
//! - Server test harness (TestAuthServer for E2E tests, backed by an
//!   in-memory account store and a recording notifier)
//! - Deterministic configuration (fixed signing secret, cheapest bcrypt cost)
//! - Token builders for forged, expired or wrongly-typed tokens
//! - Fixed test emails and passwords
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestAuthServer::spawn().await?;
//!     let pair = server.sign_in(TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
//!
//!     pair.access_token
//!         .assert_valid_jwt()
//!         .assert_for_subject(TEST_EMAIL_ALICE)
//!         .assert_kind("access");
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
