use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::types::ApiMessage;
use thiserror::Error;

/// Every failure the auth service can report.
///
/// The `Display` text carries internal detail for logs. What the client sees
/// is produced by `IntoResponse` and never includes that detail for the
/// dependency-failure variants.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Email is already registered")]
    AlreadyRegistered,

    #[error("Email is already pending confirmation")]
    AlreadyPending,

    #[error("No pending account for confirmation token")]
    NotPending,

    #[error("Confirmation token expired")]
    ConfirmationExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Notification dispatch failed: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Internal server error")]
    Internal,
}

impl AuthError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::BadRequest(_)
            | AuthError::AlreadyRegistered
            | AuthError::AlreadyPending
            | AuthError::NotPending
            | AuthError::ConfirmationExpired => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AuthError::Database(_)
            | AuthError::Crypto(_)
            | AuthError::Notification(_)
            | AuthError::Config(_)
            | AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing text. Token failures share one message regardless of
    /// which check rejected the token.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::BadRequest(msg) => msg.clone(),
            AuthError::AlreadyRegistered => "This email is already registered".to_string(),
            AuthError::AlreadyPending => "User is already pending".to_string(),
            AuthError::NotPending => {
                "This account is not registered yet or token is expired. Try sign up again."
                    .to_string()
            }
            AuthError::ConfirmationExpired => "Token is expired. Please, sign up again".to_string(),
            AuthError::InvalidCredentials => "Can't find user with pair (email, password)".to_string(),
            AuthError::InvalidToken(_) => "Token is expired or not correct".to_string(),
            AuthError::Timeout => "Request timed out".to_string(),
            AuthError::Database(_)
            | AuthError::Crypto(_)
            | AuthError::Notification(_)
            | AuthError::Config(_)
            | AuthError::Internal => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(target: "auth.errors", error = %self, "Request failed");
        } else {
            tracing::debug!(target: "auth.errors", error = %self, "Request rejected");
        }

        let body = ApiMessage::new(self.public_message(), status.as_u16());
        (status, Json(body)).into_response()
    }
}
