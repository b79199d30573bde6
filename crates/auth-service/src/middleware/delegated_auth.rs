//! Delegated authorization gate for resource services.
//!
//! Mutating requests are forwarded to the auth service's `GET /validate`
//! before they reach the handler. Read-only methods (`GET`, `HEAD`,
//! `OPTIONS`) pass through unchecked.
//!
//! ```rust,ignore
//! let gate = Arc::new(GateState::new(
//!     "http://auth:8080/validate".to_string(),
//!     Duration::from_secs(5),
//! )?);
//! let app = Router::new()
//!     .route("/items", post(create_item))
//!     .route_layer(middleware::from_fn_with_state(gate, require_remote_validation));
//! ```

use crate::errors::AuthError;
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::IntoResponse,
};
use common::secret::{ExposeSecret, SecretString};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, instrument, warn};

/// State for the delegated authorization middleware.
#[derive(Clone)]
pub struct GateState {
    /// HTTP client with the outbound call timeout applied.
    pub client: Client,
    /// Full URL of the auth service's validate endpoint.
    pub validate_url: String,
}

impl GateState {
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the HTTP client cannot be built.
    pub fn new(validate_url: String, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                error!(target: "auth.middleware.gate", error = %e, "Failed to build HTTP client");
                AuthError::Internal
            })?;

        Ok(Self {
            client,
            validate_url,
        })
    }

    /// Ask the auth service whether `token` is a valid access token.
    async fn is_authorized(&self, token: &SecretString) -> bool {
        match self
            .client
            .get(&self.validate_url)
            .query(&[("token", token.expose_secret())])
            .send()
            .await
        {
            Ok(response) => {
                let authorized = response.status().is_success();
                if !authorized {
                    tracing::debug!(
                        target: "auth.middleware.gate",
                        status = %response.status(),
                        "Validation rejected token"
                    );
                }
                authorized
            }
            Err(e) => {
                warn!(target: "auth.middleware.gate", error = %e, "Validation request failed");
                false
            }
        }
    }
}

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Reject mutating requests whose bearer token the auth service does not
/// accept.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// Any failure, including an unreachable auth service, is a 401 with the
/// standard envelope.
#[instrument(skip_all, name = "auth.middleware.gate", fields(method = %req.method()))]
pub async fn require_remote_validation(
    State(state): State<Arc<GateState>>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, AuthError> {
    if is_read_only(req.method()) {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(|t| SecretString::from(t.to_string()))
        .ok_or_else(|| {
            tracing::debug!(target: "auth.middleware.gate", "Missing or malformed Authorization header");
            AuthError::InvalidToken("Missing bearer token".to_string())
        })?;

    if !state.is_authorized(&token).await {
        return Err(AuthError::InvalidToken("Rejected by auth service".to_string()));
    }

    Ok(next.run(req).await)
}
