//! Secret types for values that must never reach a log line.
//!
//! Re-exports the [`secrecy`] wrappers. `SecretString` renders as
//! `[REDACTED]` under `Debug`, so request structs that derive `Debug` stay safe
//! to trace even when they carry a password or a bearer token.
//!
//! Use `SecretString` for:
//! - account passwords in signup/sign-in bodies
//! - the HMAC signing secret
//! - bearer tokens forwarded by the authorization gate
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct SignInRequest {
//!     email: String,
//!     password: SecretString,
//! }
//!
//! let req = SignInRequest {
//!     email: "a@x.com".to_string(),
//!     password: SecretString::from("p1"),
//! };
//!
//! assert!(!format!("{req:?}").contains("p1"));
//! assert_eq!(req.password.expose_secret(), "p1");
//! ```

pub use secrecy::{ExposeSecret, SecretString};
