use crate::errors::AuthError;
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default bcrypt cost factor (2^12 iterations, ~200ms per hash).
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Minimum accepted bcrypt cost.
pub const MIN_BCRYPT_COST: u32 = 10;

/// Maximum accepted bcrypt cost. Above this, sign-in latency becomes user-visible.
pub const MAX_BCRYPT_COST: u32 = 14;

/// Default window between signup and confirmation, in seconds.
pub const DEFAULT_CONFIRMATION_WINDOW_SECONDS: i64 = 900;

/// Default bound on any single store or notifier call, in seconds.
pub const DEFAULT_EXTERNAL_CALL_TIMEOUT_SECONDS: u64 = 5;

/// Minimum length of the HMAC signing secret.
pub const MIN_SIGNING_SECRET_BYTES: usize = 32;

pub const ACCESS_TOKEN_DURATION_VAR: &str = "ACCESS_TOKENS_DURATION_MINUTES";
pub const REFRESH_TOKEN_DURATION_VAR: &str = "REFRESH_TOKENS_DURATION_MINUTES";
pub const CONFIRMATION_WINDOW_VAR: &str = "CONFIRMATION_WINDOW_SECONDS";

/// A duration read from configuration.
///
/// Malformed values do not stop the process. They are kept as `Invalid` and
/// only fail the requests that need them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationSetting {
    Seconds(i64),
    Invalid { var: &'static str },
}

impl DurationSetting {
    /// Parse a positive whole number of minutes. Absent, zero, negative and
    /// non-numeric values are all invalid.
    pub fn from_minutes(var: &'static str, raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().parse::<i64>()) {
            Some(Ok(minutes)) if minutes > 0 => match minutes.checked_mul(60) {
                Some(seconds) => DurationSetting::Seconds(seconds),
                None => DurationSetting::Invalid { var },
            },
            _ => DurationSetting::Invalid { var },
        }
    }

    /// Parse a positive whole number of seconds, falling back to `default`
    /// when the variable is absent.
    pub fn from_seconds_or(var: &'static str, raw: Option<&str>, default: i64) -> Self {
        match raw.map(|v| v.trim().parse::<i64>()) {
            None => DurationSetting::Seconds(default),
            Some(Ok(seconds)) if seconds > 0 => DurationSetting::Seconds(seconds),
            Some(_) => DurationSetting::Invalid { var },
        }
    }

    /// Resolve to seconds, or a configuration error for this request.
    pub fn seconds(&self) -> Result<i64, AuthError> {
        match self {
            DurationSetting::Seconds(s) => Ok(*s),
            DurationSetting::Invalid { var } => Err(AuthError::Config(format!(
                "{} is missing or not a positive integer",
                var
            ))),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, DurationSetting::Seconds(_))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub signing_secret: SecretString,
    pub access_token_ttl: DurationSetting,
    pub refresh_token_ttl: DurationSetting,
    pub confirmation_window: DurationSetting,
    pub bcrypt_cost: u32,
    pub notifier_url: String,
    pub confirm_route: String,
    pub external_call_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signing secret: {0}")]
    InvalidSigningSecret(String),

    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let required = |name: &str| -> Result<String, ConfigError> {
            vars.get(name)
                .cloned()
                .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
        };

        let database_url = required("DATABASE_URL")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let signing_secret = SecretString::from(required("JWT_HS256_SECRET")?);
        if signing_secret.expose_secret().len() < MIN_SIGNING_SECRET_BYTES {
            return Err(ConfigError::InvalidSigningSecret(format!(
                "Expected at least {} bytes, got {}",
                MIN_SIGNING_SECRET_BYTES,
                signing_secret.expose_secret().len()
            )));
        }

        let access_token_ttl = DurationSetting::from_minutes(
            ACCESS_TOKEN_DURATION_VAR,
            vars.get(ACCESS_TOKEN_DURATION_VAR).map(String::as_str),
        );
        let refresh_token_ttl = DurationSetting::from_minutes(
            REFRESH_TOKEN_DURATION_VAR,
            vars.get(REFRESH_TOKEN_DURATION_VAR).map(String::as_str),
        );
        let confirmation_window = DurationSetting::from_seconds_or(
            CONFIRMATION_WINDOW_VAR,
            vars.get(CONFIRMATION_WINDOW_VAR).map(String::as_str),
            DEFAULT_CONFIRMATION_WINDOW_SECONDS,
        );

        let bcrypt_cost = match vars.get("BCRYPT_COST") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: "BCRYPT_COST".to_string(),
                    reason: e.to_string(),
                })?,
            None => DEFAULT_BCRYPT_COST,
        };

        let notifier_url = required("NOTIFIER_URL")?;
        let confirm_route = required("AUTH_CONFIRM_ROUTE")?;

        let external_call_timeout = match vars.get("EXTERNAL_CALL_TIMEOUT_SECONDS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::InvalidValue {
                        var: "EXTERNAL_CALL_TIMEOUT_SECONDS".to_string(),
                        reason: e.to_string(),
                    })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        var: "EXTERNAL_CALL_TIMEOUT_SECONDS".to_string(),
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_EXTERNAL_CALL_TIMEOUT_SECONDS),
        };

        Ok(Config {
            database_url,
            bind_address,
            signing_secret,
            access_token_ttl,
            refresh_token_ttl,
            confirmation_window,
            bcrypt_cost,
            notifier_url,
            confirm_route,
            external_call_timeout,
        })
    }

    /// Log settings that will fail requests later, so operators see them at startup.
    pub fn warn_on_invalid_settings(&self) {
        for setting in [
            &self.access_token_ttl,
            &self.refresh_token_ttl,
            &self.confirmation_window,
        ] {
            if let DurationSetting::Invalid { var } = setting {
                tracing::warn!(
                    var = *var,
                    "Duration setting is invalid; requests that need it will fail"
                );
            }
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            tracing::warn!(
                cost = self.bcrypt_cost,
                "BCRYPT_COST is outside {}-{}; signups will fail",
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST
            );
        }
    }
}
