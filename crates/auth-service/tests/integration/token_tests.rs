//! Integration tests for token rejection over HTTP
//!
//! Every rejected token gets the same 401 envelope, whatever check failed.

use auth_test_utils::*;
use common::types::ApiMessage;
use jsonwebtoken::Algorithm;
use reqwest::StatusCode;

async fn assert_rejected(server: &TestAuthServer, token: &str) -> Result<(), anyhow::Error> {
    let response = server
        .client()
        .get(format!("{}/validate", server.url()))
        .query(&[("token", token)])
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ApiMessage = response.json().await?;
    assert_eq!(body, ApiMessage::new(TEXT_INVALID_TOKEN, 401));
    Ok(())
}

/// A token built with the test secret validates (sanity check for the builder).
#[tokio::test]
async fn test_builder_token_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let token = TestTokenBuilder::new().for_subject(TEST_EMAIL_ALICE).sign();

    let response = server
        .client()
        .get(format!("{}/validate", server.url()))
        .query(&[("token", token.as_str())])
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

/// Other HMAC variants are accepted when signed with the shared secret.
#[tokio::test]
async fn test_hs512_token_is_accepted() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .with_algorithm(Algorithm::HS512)
        .sign();

    let response = server
        .client()
        .get(format!("{}/validate", server.url()))
        .query(&[("token", token.as_str())])
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_expired_token_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let token = TestTokenBuilder::new().expires_in(-1).sign();
    assert_rejected(&server, &token).await
}

#[tokio::test]
async fn test_foreign_secret_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let token = TestTokenBuilder::new()
        .with_secret(b"some-other-secret-0123456789abcd")
        .sign();
    assert_rejected(&server, &token).await
}

#[tokio::test]
async fn test_unknown_kind_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let token = TestTokenBuilder::new().with_kind("admin").sign();
    assert_rejected(&server, &token).await
}

#[tokio::test]
async fn test_alg_none_rejected() -> Result<(), anyhow::Error> {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let server = TestAuthServer::spawn().await?;
    let claims = TestTokenBuilder::new().build();
    let token = format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
    );
    assert_rejected(&server, &token).await
}

#[tokio::test]
async fn test_garbage_and_oversized_tokens_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    assert_rejected(&server, "not.a.jwt").await?;
    assert_rejected(&server, &"a".repeat(5000)).await
}

/// A token issued by the server's own issuer validates until it expires.
#[tokio::test]
async fn test_server_issuer_round_trip() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let pair = server.issuer().issue(TEST_EMAIL_BOB)?;

    pair.access_token.assert_for_subject(TEST_EMAIL_BOB);
    let response = server
        .client()
        .get(format!("{}/validate", server.url()))
        .query(&[("token", pair.access_token.as_str())])
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
