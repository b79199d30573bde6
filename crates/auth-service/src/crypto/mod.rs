use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::AuthError;
use crate::models::TokenKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// Maximum allowed JWT size in bytes (4KB).
///
/// Our tokens are ~200 bytes. Anything larger is rejected before base64
/// decoding or MAC verification.
const MAX_JWT_SIZE_BYTES: usize = 4096;

/// Longest password bcrypt hashes in full. Longer input would be cut at this
/// length, so it is rejected instead.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Length of a confirmation token in characters.
pub const CONFIRMATION_TOKEN_LEN: usize = 32;

const CONFIRMATION_TOKEN_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Signing algorithms accepted by `verify_jwt`. Only the HMAC family.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// JWT claims for access and refresh tokens.
///
/// `sub` is the account email and is redacted from Debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("kind", &self.kind)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// bcrypt password hasher with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password. The salt is random, so equal passwords give different digests.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::BadRequest` if the password is longer than
    /// `MAX_PASSWORD_BYTES`, and `AuthError::Crypto` if the cost is outside
    /// 10-14 or bcrypt fails.
    #[instrument(skip_all)]
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::BadRequest(password_too_long()));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.cost) {
            return Err(AuthError::Crypto(format!(
                "Invalid bcrypt cost: {} (must be {}-{})",
                self.cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }

        bcrypt::hash(password, self.cost)
            .map_err(|e| AuthError::Crypto(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored digest.
    ///
    /// A password longer than `MAX_PASSWORD_BYTES` never matches: `hash`
    /// refuses it, and bcrypt would otherwise compare only its prefix.
    #[instrument(skip_all)]
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool, AuthError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        bcrypt::verify(password, digest)
            .map_err(|e| AuthError::Crypto(format!("Password verification failed: {}", e)))
    }

    /// Spend the same work as a verification when there is no digest to
    /// check against, so a missing account answers as slowly as a wrong password.
    ///
    /// The cost is clamped to the accepted range so a misconfigured cost
    /// cannot make this arbitrarily slow.
    #[instrument(skip_all)]
    pub fn burn_verification(&self, password: &str) {
        if let Err(e) = bcrypt::hash(password, self.burn_cost()) {
            tracing::debug!(target: "crypto", error = %e, "Dummy hash failed");
        }
    }
}

impl PasswordHasher {
    fn burn_cost(&self) -> u32 {
        self.cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST)
    }
}

fn password_too_long() -> String {
    format!("Password must be at most {} bytes", MAX_PASSWORD_BYTES)
}

/// Generate cryptographically secure random bytes
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, AuthError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| AuthError::Crypto(format!("Random bytes generation failed: {}", e)))?;
    Ok(bytes)
}

/// Generate an opaque confirmation token of `CONFIRMATION_TOKEN_LEN` characters
/// from `[A-Za-z0-9]`.
///
/// Bytes at or above the largest multiple of the alphabet size are discarded
/// so every character is equally likely.
#[instrument(skip_all)]
pub fn generate_confirmation_token() -> Result<String, AuthError> {
    let alphabet_len = CONFIRMATION_TOKEN_ALPHABET.len();
    let limit = 256 - (256 % alphabet_len);
    let mut token = String::with_capacity(CONFIRMATION_TOKEN_LEN);

    while token.len() < CONFIRMATION_TOKEN_LEN {
        for byte in generate_random_bytes(CONFIRMATION_TOKEN_LEN)? {
            let idx = usize::from(byte);
            if idx >= limit {
                continue;
            }
            if let Some(c) = CONFIRMATION_TOKEN_ALPHABET.get(idx % alphabet_len) {
                token.push(char::from(*c));
            }
            if token.len() == CONFIRMATION_TOKEN_LEN {
                break;
            }
        }
    }

    Ok(token)
}

/// Sign claims with HS256.
#[instrument(skip_all)]
pub fn sign_jwt(claims: &Claims, key: &EncodingKey) -> Result<String, AuthError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".to_string());

    encode(&header, claims, key)
        .map_err(|e| AuthError::Crypto(format!("JWT signing operation failed: {}", e)))
}

/// Verify a JWT's size, algorithm and MAC, and decode its claims.
///
/// Expiry and token kind are NOT checked here; see
/// `services::token_service::TokenIssuer::validate_at`. Tokens whose header
/// names anything other than an HMAC algorithm are rejected even if they are
/// otherwise well formed.
#[instrument(skip_all)]
pub fn verify_jwt(token: &str, key: &DecodingKey) -> Result<Claims, AuthError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "crypto",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(AuthError::InvalidToken("oversized".to_string()));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
    // Expiry is checked by the caller with a strict `now >= exp` boundary.
    validation.validate_exp = false;
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, key, &validation).map_err(|e| {
        tracing::debug!(target: "crypto", error = %e, "Token verification failed");
        AuthError::InvalidToken("verification failed".to_string())
    })?;

    Ok(token_data.claims)
}
