use crate::config::Config;
use crate::crypto::{Claims, PasswordHasher};
use crate::errors::AuthError;
use crate::models::{AccountFilter, AccountSet, TokenKind};
use crate::observability::{hash_for_correlation, metrics, outcome};
use crate::repositories::{bounded, AccountStore};
use crate::services::token_service::TokenIssuer;
use common::types::TokenPair;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Sign-in, refresh and validation.
///
/// Only the active set is consulted; pending accounts cannot sign in.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    call_timeout: Duration,
}

impl SessionService {
    pub fn new(config: &Config, store: Arc<dyn AccountStore>, issuer: TokenIssuer) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(config.bcrypt_cost),
            issuer,
            call_timeout: config.external_call_timeout,
        }
    }

    /// Exchange credentials for a token pair.
    ///
    /// An unknown email and a wrong password both fail with
    /// `InvalidCredentials`, and both cost one bcrypt run.
    #[instrument(skip_all, fields(email_hash = %hash_for_correlation(email)))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let result = self.authenticate(email, password).await;
        metrics::record_signin(outcome(&result));
        result
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let account = bounded(
            self.call_timeout,
            "find",
            AccountSet::Active,
            self.store
                .find(AccountSet::Active, &AccountFilter::Email(email.to_string())),
        )
        .await?;

        let Some(account) = account else {
            self.hasher.burn_verification(password);
            tracing::debug!(target: "auth.services.session", "Sign-in rejected: no active account");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &account.password_hash)? {
            tracing::debug!(target: "auth.services.session", "Sign-in rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.issuer.issue(&account.email)
    }

    /// Mint a fresh pair from a refresh token.
    ///
    /// Refresh tokens are not consumed; the same one can be replayed until it
    /// expires.
    #[instrument(skip_all)]
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.issuer.validate(refresh_token, TokenKind::Refresh)?;
        self.issuer.issue(&claims.sub)
    }

    /// Validate an access token.
    pub fn validate(&self, access_token: &str) -> Result<Claims, AuthError> {
        self.issuer.validate(access_token, TokenKind::Access)
    }
}
