//! Integration tests for sign-in, refresh and validate

use auth_test_utils::*;
use common::types::{ApiMessage, TokenPair};
use reqwest::StatusCode;
use serde_json::json;

async fn sign_in_raw(
    server: &TestAuthServer,
    email: &str,
    password: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(server
        .client()
        .put(format!("{}/signin", server.url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?)
}

async fn validate(server: &TestAuthServer, token: &str) -> Result<(StatusCode, ApiMessage), anyhow::Error> {
    let response = server
        .client()
        .get(format!("{}/validate", server.url()))
        .query(&[("token", token)])
        .send()
        .await?;
    let status = response.status();
    Ok((status, response.json().await?))
}

async fn refresh(server: &TestAuthServer, token: &str) -> Result<reqwest::Response, anyhow::Error> {
    Ok(server
        .client()
        .put(format!("{}/refresh", server.url()))
        .query(&[("token", token)])
        .send()
        .await?)
}

// ============================================================================
// Sign-in
// ============================================================================

/// Sign-in returns a pair whose tokens carry the account email.
#[tokio::test]
async fn test_sign_in_returns_token_pair() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.create_active_account(TEST_EMAIL_ALICE, TEST_PASSWORD)?;

    let response = sign_in_raw(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let pair: TokenPair = response.json().await?;

    assert_eq!(pair.email, TEST_EMAIL_ALICE);
    pair.access_token
        .assert_valid_jwt()
        .assert_for_subject(TEST_EMAIL_ALICE)
        .assert_kind("access")
        .assert_expires_in((TEST_ACCESS_MINUTES * 60) as u64);
    pair.refresh_token
        .assert_valid_jwt()
        .assert_for_subject(TEST_EMAIL_ALICE)
        .assert_kind("refresh")
        .assert_expires_in((TEST_REFRESH_MINUTES * 60) as u64);

    Ok(())
}

/// Wrong password and unknown email are indistinguishable to the caller.
#[tokio::test]
async fn test_sign_in_failures_are_indistinguishable() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.create_active_account(TEST_EMAIL_ALICE, TEST_PASSWORD)?;

    let wrong_password = sign_in_raw(&server, TEST_EMAIL_ALICE, TEST_WRONG_PASSWORD).await?;
    let unknown_email = sign_in_raw(&server, TEST_EMAIL_UNKNOWN, TEST_PASSWORD).await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status(), unknown_email.status());

    let wrong_password: ApiMessage = wrong_password.json().await?;
    let unknown_email: ApiMessage = unknown_email.json().await?;
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password, ApiMessage::new(TEXT_INVALID_CREDENTIALS, 401));

    Ok(())
}

/// A pending (unconfirmed) account cannot sign in.
#[tokio::test]
async fn test_pending_account_cannot_sign_in() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    server
        .client()
        .post(format!("{}/signup", server.url()))
        .json(&json!({ "email": TEST_EMAIL_BOB, "password": TEST_PASSWORD }))
        .send()
        .await?;

    let response = sign_in_raw(&server, TEST_EMAIL_BOB, TEST_PASSWORD).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

/// An unparseable token duration fails issuance with a generic 500.
#[tokio::test]
async fn test_sign_in_with_misconfigured_duration() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn_with_config(test_config_with(&[(
        "REFRESH_TOKENS_DURATION_MINUTES",
        "forever",
    )]))
    .await?;
    server.create_active_account(TEST_EMAIL_ALICE, TEST_PASSWORD)?;

    let response = sign_in_raw(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ApiMessage = response.json().await?;
    assert_eq!(body, ApiMessage::new(TEXT_INTERNAL_ERROR, 500));

    // The process keeps serving
    let health = server
        .client()
        .get(format!("{}/health", server.url()))
        .send()
        .await?;
    assert_eq!(health.status(), StatusCode::OK);
    Ok(())
}

/// A store outage is a generic 500, not an authentication failure.
#[tokio::test]
async fn test_sign_in_store_failure() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.store().set_failing(true);

    let response = sign_in_raw(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

// ============================================================================
// Validate
// ============================================================================

/// An access token validates; the response is only the verdict.
#[tokio::test]
async fn test_validate_access_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.create_active_account(TEST_EMAIL_ALICE, TEST_PASSWORD)?;
    let pair = server.sign_in(TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    let (status, body) = validate(&server, &pair.access_token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ApiMessage::new(TEXT_AUTHORIZED, 200));
    Ok(())
}

/// A refresh token is not accepted by validate.
#[tokio::test]
async fn test_validate_rejects_refresh_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.create_active_account(TEST_EMAIL_ALICE, TEST_PASSWORD)?;
    let pair = server.sign_in(TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    let (status, body) = validate(&server, &pair.refresh_token).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, ApiMessage::new(TEXT_INVALID_TOKEN, 401));
    Ok(())
}

/// Validate without a token is a client error.
#[tokio::test]
async fn test_validate_missing_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/validate", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

// ============================================================================
// Refresh
// ============================================================================

/// Refresh mints a new pair for the same subject, and may be replayed.
#[tokio::test]
async fn test_refresh_issues_new_pair() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.create_active_account(TEST_EMAIL_ALICE, TEST_PASSWORD)?;
    let pair = server.sign_in(TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    for _ in 0..2 {
        let response = refresh(&server, &pair.refresh_token).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let refreshed: TokenPair = response.json().await?;
        assert_eq!(refreshed.email, TEST_EMAIL_ALICE);
        refreshed
            .access_token
            .assert_for_subject(TEST_EMAIL_ALICE)
            .assert_kind("access");

        let (status, _) = validate(&server, &refreshed.access_token).await?;
        assert_eq!(status, StatusCode::OK);
    }
    Ok(())
}

/// Refresh rejects an access token.
#[tokio::test]
async fn test_refresh_rejects_access_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.create_active_account(TEST_EMAIL_ALICE, TEST_PASSWORD)?;
    let pair = server.sign_in(TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    let response = refresh(&server, &pair.access_token).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ApiMessage = response.json().await?;
    assert_eq!(body.text, TEXT_INVALID_TOKEN);
    Ok(())
}

/// Sign-in is PUT only.
#[tokio::test]
async fn test_sign_in_wrong_method() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/signin", server.url()))
        .json(&json!({ "email": TEST_EMAIL_ALICE, "password": TEST_PASSWORD }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

/// Passwords bcrypt would truncate are refused at signup and sign-in.
#[tokio::test]
async fn test_overlong_password_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let prefix = "A".repeat(72);
    let long_password = format!("{prefix}correct");

    let response = server
        .client()
        .post(format!("{}/signup", server.url()))
        .json(&json!({ "email": TEST_EMAIL_ALICE, "password": long_password }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiMessage = response.json().await?;
    assert_eq!(body, ApiMessage::new("Password must be at most 72 bytes", 400));
    assert_eq!(server.notifier().call_count(), 0);

    server.create_active_account(TEST_EMAIL_BOB, &prefix)?;
    let response = sign_in_raw(&server, TEST_EMAIL_BOB, &format!("{prefix}WRONG-PASSWORD")).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The 72-byte password itself still works
    let pair = server.sign_in(TEST_EMAIL_BOB, &prefix).await?;
    assert_eq!(pair.email, TEST_EMAIL_BOB);
    Ok(())
}
