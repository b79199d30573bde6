//! Notification dispatcher client.
//!
//! Delivers confirmation links through the notification relay. Success means
//! the relay accepted the message, not that the user received it.

use crate::errors::AuthError;
use crate::observability::{hash_for_correlation, metrics};
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, instrument, warn};

/// Body of a notification relay request.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRequest<'a> {
    pub email: &'a str,
    pub message: &'a str,
}

/// Build the confirmation message sent after signup.
pub fn confirmation_message(confirm_route: &str, token: &str) -> String {
    format!(
        "Please confirm registration following this link: {}?token={}",
        confirm_route, token
    )
}

/// Trait for notification delivery (enables mocking).
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Hand `message` for `email` to the relay.
    async fn send(&self, email: &str, message: &str) -> Result<(), AuthError>;
}

/// HTTP client for the notification relay.
#[derive(Clone)]
pub struct HttpNotifier {
    client: Client,
    url: String,
}

impl HttpNotifier {
    /// Create a notifier for the relay at `url`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the HTTP client cannot be built.
    pub fn new(url: String, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                error!(target: "auth.services.notifier", error = %e, "Failed to build HTTP client");
                AuthError::Internal
            })?;

        Ok(Self { client, url })
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for HttpNotifier {
    #[instrument(skip_all, fields(email_hash = %hash_for_correlation(email)))]
    async fn send(&self, email: &str, message: &str) -> Result<(), AuthError> {
        let start = Instant::now();

        let result = match self
            .client
            .put(&self.url)
            .json(&NotificationRequest { email, message })
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                warn!(target: "auth.services.notifier", status = %response.status(), "Notifier rejected message");
                Err(AuthError::Notification(format!(
                    "Notifier returned {}",
                    response.status()
                )))
            }
            Err(e) => {
                warn!(target: "auth.services.notifier", error = %e, "Notifier request failed");
                Err(AuthError::Notification(format!(
                    "Notifier request failed: {}",
                    e
                )))
            }
        };

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::record_notification(status, start.elapsed());
        result
    }
}

/// Mock notifier module for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// A message captured by [`MockNotifier`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentMessage {
        pub email: String,
        pub message: String,
    }

    impl SentMessage {
        /// Confirmation token carried in the message's link, if any.
        pub fn confirmation_token(&self) -> Option<&str> {
            self.message
                .split_once("?token=")
                .map(|(_, token)| token.trim())
        }
    }

    /// Records every message; can be switched to fail.
    #[derive(Clone, Default)]
    pub struct MockNotifier {
        sent: Arc<Mutex<Vec<SentMessage>>>,
        failing: Arc<AtomicBool>,
    }

    impl MockNotifier {
        /// Create a mock that accepts every message.
        pub fn accepting() -> Self {
            Self::default()
        }

        /// Create a mock that rejects every message.
        pub fn failing() -> Self {
            let mock = Self::default();
            mock.set_failing(true);
            mock
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Messages accepted so far, oldest first.
        pub fn sent(&self) -> Vec<SentMessage> {
            self.sent.lock().map(|s| s.clone()).unwrap_or_default()
        }

        pub fn call_count(&self) -> usize {
            self.sent().len()
        }

        /// Confirmation token from the most recent message to `email`.
        pub fn last_token_for(&self, email: &str) -> Option<String> {
            self.sent()
                .iter()
                .rev()
                .find(|m| m.email == email)
                .and_then(|m| m.confirmation_token().map(str::to_string))
        }
    }

    #[async_trait::async_trait]
    impl NotificationDispatcher for MockNotifier {
        async fn send(&self, email: &str, message: &str) -> Result<(), AuthError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AuthError::Notification("Mock notifier failure".to_string()));
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(SentMessage {
                    email: email.to_string(),
                    message: message.to_string(),
                });
            }
            Ok(())
        }
    }
}
