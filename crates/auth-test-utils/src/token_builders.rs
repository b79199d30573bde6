//! Builder patterns for test tokens
//!
//! Produces tokens the service would never issue itself: expired, wrongly
//! typed, signed with another secret or another HMAC variant.

use crate::fixtures::TEST_SIGNING_SECRET;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

/// Builder for test JWTs
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_subject("alice@example.com")
///     .refresh()
///     .expires_in(-60)
///     .sign();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    kind: String,
    exp: i64,
    iat: i64,
    algorithm: Algorithm,
    secret: Vec<u8>,
}

impl TestTokenBuilder {
    /// Create a new builder: access token, valid for one hour, signed with
    /// the test secret using HS256.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject@example.com".to_string(),
            kind: "access".to_string(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            algorithm: Algorithm::HS256,
            secret: TEST_SIGNING_SECRET.as_bytes().to_vec(),
        }
    }

    /// Set the subject email
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Mark as a refresh token
    pub fn refresh(mut self) -> Self {
        self.kind = "refresh".to_string();
        self
    }

    /// Set an arbitrary `type` claim
    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Sign with a different HMAC algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sign with a different secret
    pub fn with_secret(mut self, secret: &[u8]) -> Self {
        self.secret = secret.to_vec();
        self
    }

    /// Build the claims as a JSON value
    pub fn build(&self) -> serde_json::Value {
        json!({
            "sub": self.sub,
            "type": self.kind,
            "exp": self.exp,
            "iat": self.iat,
        })
    }

    /// Build and sign the token
    pub fn sign(self) -> String {
        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        encode(
            &header,
            &self.build(),
            &EncodingKey::from_secret(&self.secret),
        )
        .expect("HMAC signing should not fail")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
