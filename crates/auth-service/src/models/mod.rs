use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Account record, stored in either the pending or the active set.
///
/// `password_hash` is a bcrypt digest. `confirm_token` is only set while the
/// account is pending. `created_at` is epoch seconds.
#[derive(Clone, PartialEq, Eq, FromRow)]
pub struct Account {
    pub email: String,
    pub password_hash: String,
    pub confirm_token: Option<String>,
    pub created_at: i64,
}

/// Custom Debug implementation that redacts the hash and confirmation token.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field(
                "confirm_token",
                &self.confirm_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// The two logical record sets of the account store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountSet {
    Pending,
    Active,
}

impl AccountSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountSet::Pending => "pending",
            AccountSet::Active => "active",
        }
    }
}

/// Lookup key for store queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    Email(String),
    ConfirmationToken(String),
}

impl AccountFilter {
    pub fn matches(&self, account: &Account) -> bool {
        match self {
            AccountFilter::Email(email) => account.email == *email,
            AccountFilter::ConfirmationToken(token) => {
                account.confirm_token.as_deref() == Some(token.as_str())
            }
        }
    }
}

/// Kind of bearer token, embedded in the token's `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}
