use crate::config::{Config, DurationSetting};
use crate::crypto::{self, PasswordHasher};
use crate::errors::AuthError;
use crate::models::{Account, AccountFilter, AccountSet};
use crate::observability::{hash_for_correlation, metrics, outcome};
use crate::repositories::{bounded, AccountStore};
use crate::services::notifier::{confirmation_message, NotificationDispatcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Signup and confirmation.
///
/// An account moves `unregistered -> pending -> active`, or is deleted from
/// pending when it is confirmed after its window has elapsed. Expired pending
/// accounts are only removed on a late confirm; nothing sweeps them.
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn AccountStore>,
    notifier: Arc<dyn NotificationDispatcher>,
    hasher: PasswordHasher,
    confirm_route: String,
    confirmation_window: DurationSetting,
    call_timeout: Duration,
}

impl RegistrationService {
    pub fn new(
        config: &Config,
        store: Arc<dyn AccountStore>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            notifier,
            hasher: PasswordHasher::new(config.bcrypt_cost),
            confirm_route: config.confirm_route.clone(),
            confirmation_window: config.confirmation_window.clone(),
            call_timeout: config.external_call_timeout,
        }
    }

    /// Register `email` as a pending account and send its confirmation link.
    pub async fn signup(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.signup_at(email, password, chrono::Utc::now().timestamp())
            .await
    }

    /// Register `email` as of `now` (epoch seconds).
    ///
    /// The pending record is written only after the notifier accepted the
    /// link, so a failed dispatch leaves nothing behind.
    #[instrument(skip_all, fields(email_hash = %hash_for_correlation(email)))]
    pub async fn signup_at(&self, email: &str, password: &str, now: i64) -> Result<(), AuthError> {
        let result = self.register(email, password, now).await;
        metrics::record_signup(outcome(&result));
        result
    }

    async fn register(&self, email: &str, password: &str, now: i64) -> Result<(), AuthError> {
        let by_email = AccountFilter::Email(email.to_string());

        let active = bounded(
            self.call_timeout,
            "find",
            AccountSet::Active,
            self.store.find(AccountSet::Active, &by_email),
        )
        .await?;
        if active.is_some() {
            return Err(AuthError::AlreadyRegistered);
        }

        let pending = bounded(
            self.call_timeout,
            "find",
            AccountSet::Pending,
            self.store.find(AccountSet::Pending, &by_email),
        )
        .await?;
        if pending.is_some() {
            return Err(AuthError::AlreadyPending);
        }

        let password_hash = self.hasher.hash(password)?;
        let token = crypto::generate_confirmation_token()?;

        let message = confirmation_message(&self.confirm_route, &token);
        match tokio::time::timeout(self.call_timeout, self.notifier.send(email, &message)).await {
            Ok(sent) => sent?,
            Err(_) => {
                return Err(AuthError::Notification(
                    "Notification dispatch timed out".to_string(),
                ))
            }
        }

        let account = Account {
            email: email.to_string(),
            password_hash,
            confirm_token: Some(token),
            created_at: now,
        };
        bounded(
            self.call_timeout,
            "insert",
            AccountSet::Pending,
            self.store.insert(AccountSet::Pending, &account),
        )
        .await?;

        tracing::info!(target: "auth.services.registration", "Pending account created");
        Ok(())
    }

    /// Confirm the pending account bound to `token`.
    pub async fn confirm(&self, token: &str) -> Result<Account, AuthError> {
        self.confirm_at(token, chrono::Utc::now().timestamp()).await
    }

    /// Confirm as of `now` (epoch seconds).
    ///
    /// The deadline is `created_at + window`; a confirm at exactly the
    /// deadline still succeeds. A late confirm deletes the pending record.
    #[instrument(skip_all)]
    pub async fn confirm_at(&self, token: &str, now: i64) -> Result<Account, AuthError> {
        let result = self.activate(token, now).await;
        metrics::record_confirmation(outcome(&result));
        result
    }

    async fn activate(&self, token: &str, now: i64) -> Result<Account, AuthError> {
        let window = self.confirmation_window.seconds()?;
        let by_token = AccountFilter::ConfirmationToken(token.to_string());

        let pending = bounded(
            self.call_timeout,
            "find",
            AccountSet::Pending,
            self.store.find(AccountSet::Pending, &by_token),
        )
        .await?
        .ok_or(AuthError::NotPending)?;

        let deadline = pending.created_at.saturating_add(window);
        if now > deadline {
            bounded(
                self.call_timeout,
                "delete",
                AccountSet::Pending,
                self.store.delete(AccountSet::Pending, &by_token),
            )
            .await?;
            tracing::info!(
                target: "auth.services.registration",
                email_hash = %hash_for_correlation(&pending.email),
                "Expired pending account removed"
            );
            return Err(AuthError::ConfirmationExpired);
        }

        let active = bounded(
            self.call_timeout,
            "promote",
            AccountSet::Active,
            self.store.promote(&pending),
        )
        .await?;

        tracing::info!(
            target: "auth.services.registration",
            email_hash = %hash_for_correlation(&active.email),
            "Account activated"
        );
        Ok(active)
    }
}
