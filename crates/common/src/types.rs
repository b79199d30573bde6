//! Wire types shared by the auth service and the services that call it.

use serde::{Deserialize, Serialize};

/// Uniform response envelope: a human-readable message plus the HTTP status
/// code that accompanied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub text: String,
    pub code: u16,
}

impl ApiMessage {
    pub fn new(text: impl Into<String>, code: u16) -> Self {
        Self {
            text: text.into(),
            code,
        }
    }
}

/// Access/refresh token pair returned by sign-in and refresh.
///
/// Both tokens carry the same subject, which is echoed in `email`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}
