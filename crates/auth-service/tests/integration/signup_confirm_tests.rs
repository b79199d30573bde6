//! Integration tests for signup and confirmation

use auth_service::models::AccountSet;
use auth_test_utils::*;
use common::types::ApiMessage;
use reqwest::StatusCode;
use serde_json::json;

async fn signup(
    server: &TestAuthServer,
    email: &str,
    password: &str,
) -> Result<(StatusCode, ApiMessage), anyhow::Error> {
    let response = server
        .client()
        .post(format!("{}/signup", server.url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    let status = response.status();
    Ok((status, response.json().await?))
}

async fn confirm(
    server: &TestAuthServer,
    token: &str,
) -> Result<(StatusCode, ApiMessage), anyhow::Error> {
    let response = server
        .client()
        .get(format!("{}/confirm", server.url()))
        .query(&[("token", token)])
        .send()
        .await?;
    let status = response.status();
    Ok((status, response.json().await?))
}

// ============================================================================
// Signup
// ============================================================================

/// Signup creates only a pending record and sends the confirmation link.
#[tokio::test]
async fn test_signup_creates_pending_account() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let (status, body) = signup(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ApiMessage::new(TEXT_SIGNUP_OK, 200));

    let pending = server
        .store()
        .get(AccountSet::Pending, TEST_EMAIL_ALICE)
        .expect("pending account should exist");
    assert_ne!(pending.password_hash, TEST_PASSWORD);
    assert!(server.store().get(AccountSet::Active, TEST_EMAIL_ALICE).is_none());

    let sent = server.notifier().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, TEST_EMAIL_ALICE);
    assert!(sent[0].message.contains(&format!(
        "{}?token={}",
        server.config().confirm_route,
        pending.confirm_token.as_deref().unwrap_or_default()
    )));

    Ok(())
}

/// A second signup for a pending email fails without a second message.
#[tokio::test]
async fn test_duplicate_signup_is_already_pending() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    signup(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    let (status, body) = signup(&server, TEST_EMAIL_ALICE, "another-password").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, ApiMessage::new(TEXT_ALREADY_PENDING, 400));
    assert_eq!(server.notifier().call_count(), 1);
    Ok(())
}

/// Signup for an active email fails as already registered.
#[tokio::test]
async fn test_signup_for_active_email_is_already_registered() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.create_active_account(TEST_EMAIL_ALICE, TEST_PASSWORD)?;

    let (status, body) = signup(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.text, TEXT_ALREADY_REGISTERED);
    assert!(server.store().accounts(AccountSet::Pending).is_empty());
    Ok(())
}

/// A failed notification fails the signup and leaves no pending record.
#[tokio::test]
async fn test_notifier_failure_leaves_no_pending_record() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.notifier().set_failing(true);

    let (status, body) = signup(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, ApiMessage::new(TEXT_INTERNAL_ERROR, 500));
    assert!(server.store().accounts(AccountSet::Pending).is_empty());
    Ok(())
}

/// Malformed and incomplete bodies are rejected with the envelope.
#[tokio::test]
async fn test_signup_rejects_bad_bodies() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/signup", server.url()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiMessage = response.json().await?;
    assert_eq!(body.code, 400);

    let response = server
        .client()
        .post(format!("{}/signup", server.url()))
        .json(&json!({ "email": TEST_EMAIL_ALICE }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = signup(&server, "", TEST_PASSWORD).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(server.notifier().call_count(), 0);
    Ok(())
}

// ============================================================================
// Confirmation
// ============================================================================

/// Full scenario: signup, duplicate, confirm, sign in with the first password only.
#[tokio::test]
async fn test_signup_confirm_sign_in_scenario() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let (status, _) = signup(&server, "a@x.com", "p1").await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = signup(&server, "a@x.com", "p2").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.text, TEXT_ALREADY_PENDING);

    let token = server
        .notifier()
        .last_token_for("a@x.com")
        .expect("confirmation token should be sent");
    let (status, body) = confirm(&server, &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ApiMessage::new(TEXT_CONFIRM_OK, 200));

    assert!(server.store().get(AccountSet::Pending, "a@x.com").is_none());
    let active = server
        .store()
        .get(AccountSet::Active, "a@x.com")
        .expect("active account should exist");
    assert!(active.confirm_token.is_none());

    let pair = server.sign_in("a@x.com", "p1").await?;
    assert_eq!(pair.email, "a@x.com");
    pair.access_token.assert_for_subject("a@x.com");

    assert!(server.sign_in("a@x.com", "p2").await.is_err());
    Ok(())
}

/// A confirmation token works once.
#[tokio::test]
async fn test_confirm_token_is_single_use() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    signup(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    let token = server
        .notifier()
        .last_token_for(TEST_EMAIL_ALICE)
        .expect("token");

    let (status, _) = confirm(&server, &token).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = confirm(&server, &token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.text, TEXT_NOT_PENDING);
    Ok(())
}

/// Confirming after the window deletes the pending record; a retry reports
/// "not registered".
#[tokio::test]
async fn test_late_confirm_expires_pending_account() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn_with_config(test_config_with(&[(
        "CONFIRMATION_WINDOW_SECONDS",
        "1",
    )]))
    .await?;
    signup(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    let token = server
        .notifier()
        .last_token_for(TEST_EMAIL_ALICE)
        .expect("token");

    // Two whole seconds past created_at is beyond a one second window
    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    let (status, body) = confirm(&server, &token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, ApiMessage::new(TEXT_CONFIRMATION_EXPIRED, 400));
    assert!(server.store().accounts(AccountSet::Pending).is_empty());
    assert!(server.store().accounts(AccountSet::Active).is_empty());

    let (status, body) = confirm(&server, &token).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.text, TEXT_NOT_PENDING);
    Ok(())
}

/// Unknown and missing tokens.
#[tokio::test]
async fn test_confirm_unknown_or_missing_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let (status, body) = confirm(&server, "no-such-token").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.text, TEXT_NOT_PENDING);

    let response = server
        .client()
        .get(format!("{}/confirm", server.url()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiMessage = response.json().await?;
    assert_eq!(body.text, "Missing token");
    Ok(())
}

/// A malformed confirmation window fails confirm with a generic 500 but
/// leaves signup working.
#[tokio::test]
async fn test_invalid_window_fails_confirm_only() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn_with_config(test_config_with(&[(
        "CONFIRMATION_WINDOW_SECONDS",
        "soon",
    )]))
    .await?;

    let (status, _) = signup(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);

    let token = server
        .notifier()
        .last_token_for(TEST_EMAIL_ALICE)
        .expect("token");
    let (status, body) = confirm(&server, &token).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.text, TEXT_INTERNAL_ERROR);
    Ok(())
}
