//! Observability for the auth service.
//!
//! Log fields fall into three groups:
//! - **SAFE**: logged as-is (token kind, account set, outcome labels)
//! - **HASHED**: emails, logged only through [`hash_for_correlation`]
//! - **NEVER**: passwords, password hashes, confirmation tokens, bearer tokens

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// Lets operators follow one account across log lines without writing its
/// email address to the log.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..4])
}

/// Error categories for metrics labels (bounded cardinality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed requests and state conflicts (already registered, not pending)
    Client,
    /// Bad credentials, rejected or expired tokens, expired confirmations
    Authentication,
    /// Store, notifier, hashing, signing and configuration failures
    Dependency,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Client => "client",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Dependency => "dependency",
        }
    }
}

impl From<&crate::errors::AuthError> for ErrorCategory {
    fn from(err: &crate::errors::AuthError) -> Self {
        use crate::errors::AuthError;
        match err {
            AuthError::BadRequest(_)
            | AuthError::AlreadyRegistered
            | AuthError::AlreadyPending
            | AuthError::NotPending => ErrorCategory::Client,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken(_)
            | AuthError::ConfirmationExpired => ErrorCategory::Authentication,
            AuthError::Database(_)
            | AuthError::Crypto(_)
            | AuthError::Notification(_)
            | AuthError::Config(_)
            | AuthError::Timeout
            | AuthError::Internal => ErrorCategory::Dependency,
        }
    }
}

/// Outcome label for a service result: `success` or the error category.
pub fn outcome<T>(result: &Result<T, crate::errors::AuthError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) => ErrorCategory::from(e).as_str(),
    }
}
