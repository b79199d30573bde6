use crate::crypto::MAX_PASSWORD_BYTES;
use crate::errors::AuthError;
use crate::services::{RegistrationService, SessionService};
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use common::secret::{ExposeSecret, SecretString};
use common::types::{ApiMessage, TokenPair};
use serde::Deserialize;
use std::sync::Arc;

/// Email/password body of `POST /signup` and `PUT /signin`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: SecretString,
}

impl CredentialsRequest {
    fn validated(self) -> Result<Self, AuthError> {
        if self.email.is_empty() || self.password.expose_secret().is_empty() {
            return Err(AuthError::BadRequest(
                "Email and password are required".to_string(),
            ));
        }
        if self.password.expose_secret().len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::BadRequest(format!(
                "Password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }
        Ok(self)
    }
}

/// `?token=` query of confirm, refresh and validate.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

impl TokenQuery {
    fn into_token(self) -> Result<String, AuthError> {
        match self.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthError::BadRequest("Missing token".to_string())),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registration: RegistrationService,
    pub sessions: SessionService,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        AuthError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })
}

fn token_param(query: Result<Query<TokenQuery>, QueryRejection>) -> Result<String, AuthError> {
    query
        .map_err(|rejection| {
            AuthError::BadRequest(format!("Invalid query: {}", rejection.body_text()))
        })?
        .0
        .into_token()
}

/// Handle signup
///
/// POST /signup
pub async fn handle_signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<ApiMessage>, AuthError> {
    let request = json_body(payload)?.validated()?;

    state
        .registration
        .signup(&request.email, request.password.expose_secret())
        .await?;

    Ok(Json(ApiMessage::new(
        "Successfully signed up! The link is sent to your email",
        200,
    )))
}

/// Handle confirmation link
///
/// GET /confirm?token=
pub async fn handle_confirm(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<ApiMessage>, AuthError> {
    let token = token_param(query)?;
    state.registration.confirm(&token).await?;
    Ok(Json(ApiMessage::new("Successfully signed up!", 200)))
}

/// Handle sign-in
///
/// PUT /signin
pub async fn handle_signin(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AuthError> {
    let request = json_body(payload)?.validated()?;

    let pair = state
        .sessions
        .sign_in(&request.email, request.password.expose_secret())
        .await?;

    Ok(Json(pair))
}

/// Handle token refresh
///
/// PUT /refresh?token=
pub async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<TokenPair>, AuthError> {
    let token = token_param(query)?;
    Ok(Json(state.sessions.refresh(&token)?))
}

/// Handle access token validation
///
/// GET /validate?token=
///
/// Answers only with the verdict; claims are never returned.
pub async fn handle_validate(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<ApiMessage>, AuthError> {
    let token = token_param(query)?;
    state.sessions.validate(&token)?;
    Ok(Json(ApiMessage::new("Authorized", 200)))
}
