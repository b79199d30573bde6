use crate::config::{Config, DurationSetting};
use crate::crypto::{self, Claims};
use crate::errors::AuthError;
use crate::models::TokenKind;
use crate::observability::{metrics, outcome};
use common::secret::ExposeSecret;
use common::types::TokenPair;
use jsonwebtoken::{DecodingKey, EncodingKey};
use tracing::instrument;

/// Issues and validates access/refresh token pairs signed with a shared
/// HMAC secret.
///
/// Tokens are stateless: validity is the signature plus the embedded expiry.
/// There is no revocation; rotating the secret invalidates every outstanding
/// token.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: DurationSetting,
    refresh_ttl: DurationSetting,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        Self::from_parts(
            config.signing_secret.expose_secret().as_bytes(),
            config.access_token_ttl.clone(),
            config.refresh_token_ttl.clone(),
        )
    }

    pub fn from_parts(
        secret: &[u8],
        access_ttl: DurationSetting,
        refresh_ttl: DurationSetting,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Result<i64, AuthError> {
        match kind {
            TokenKind::Access => self.access_ttl.seconds(),
            TokenKind::Refresh => self.refresh_ttl.seconds(),
        }
    }

    /// Issue a token pair for `subject`, expiring relative to now.
    pub fn issue(&self, subject: &str) -> Result<TokenPair, AuthError> {
        self.issue_at(subject, chrono::Utc::now().timestamp())
    }

    /// Issue a token pair for `subject` as of `now` (epoch seconds).
    ///
    /// Both durations are resolved before anything is signed, so a
    /// misconfigured duration never yields half a pair.
    #[instrument(skip_all)]
    pub fn issue_at(&self, subject: &str, now: i64) -> Result<TokenPair, AuthError> {
        let access_ttl = self.ttl(TokenKind::Access)?;
        let refresh_ttl = self.ttl(TokenKind::Refresh)?;

        let access_token = self.sign(subject, TokenKind::Access, now, access_ttl)?;
        let refresh_token = self.sign(subject, TokenKind::Refresh, now, refresh_ttl)?;

        metrics::record_token_issuance(TokenKind::Access.as_str());
        metrics::record_token_issuance(TokenKind::Refresh.as_str());

        Ok(TokenPair {
            email: subject.to_string(),
            access_token,
            refresh_token,
        })
    }

    fn sign(&self, subject: &str, kind: TokenKind, now: i64, ttl: i64) -> Result<String, AuthError> {
        let exp = now
            .checked_add(ttl)
            .ok_or_else(|| AuthError::Config(format!("{} token lifetime overflows", kind.as_str())))?;

        let claims = Claims {
            sub: subject.to_string(),
            kind,
            iat: now,
            exp,
        };
        crypto::sign_jwt(&claims, &self.encoding_key)
    }

    /// Validate `token` as `kind` against the current time.
    pub fn validate(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        self.validate_at(token, kind, chrono::Utc::now().timestamp())
    }

    /// Validate `token` as `kind` at `now` (epoch seconds).
    ///
    /// Rejects bad signatures, non-HMAC algorithms, the wrong token kind, and
    /// any `now >= exp`. Every rejection is `InvalidToken`; the reason only
    /// reaches the debug log.
    #[instrument(skip_all, fields(kind = kind.as_str()))]
    pub fn validate_at(&self, token: &str, kind: TokenKind, now: i64) -> Result<Claims, AuthError> {
        let result = self.check(token, kind, now);
        metrics::record_token_validation(kind.as_str(), outcome(&result));
        result
    }

    fn check(&self, token: &str, kind: TokenKind, now: i64) -> Result<Claims, AuthError> {
        let claims = crypto::verify_jwt(token, &self.decoding_key)?;

        if claims.kind != kind {
            tracing::debug!(
                target: "auth.services.token",
                expected = kind.as_str(),
                actual = claims.kind.as_str(),
                "Token rejected: wrong kind"
            );
            return Err(AuthError::InvalidToken("wrong kind".to_string()));
        }

        if now >= claims.exp {
            tracing::debug!(
                target: "auth.services.token",
                exp = claims.exp,
                now,
                "Token rejected: expired"
            );
            return Err(AuthError::InvalidToken("expired".to_string()));
        }

        Ok(claims)
    }
}
