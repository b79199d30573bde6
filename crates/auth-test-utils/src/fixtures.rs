//! Deterministic configuration fixtures
//!
//! Every test server signs with the same fixed secret so tokens can be
//! forged or inspected from the test side.

use auth_service::config::{Config, MIN_BCRYPT_COST};
use std::collections::HashMap;

/// Fixed HS256 secret (32 bytes). NEVER use in production.
pub const TEST_SIGNING_SECRET: &str = "test-signing-secret-0123456789ab";

/// Access token lifetime used by test configs, in minutes.
pub const TEST_ACCESS_MINUTES: i64 = 15;

/// Refresh token lifetime used by test configs, in minutes.
pub const TEST_REFRESH_MINUTES: i64 = 24 * 60;

/// Environment-style variables for a valid test configuration.
///
/// Uses the cheapest accepted bcrypt cost to keep tests fast.
pub fn test_config_vars() -> HashMap<String, String> {
    HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgresql://unused/test".to_string(),
        ),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        (
            "JWT_HS256_SECRET".to_string(),
            TEST_SIGNING_SECRET.to_string(),
        ),
        (
            "ACCESS_TOKENS_DURATION_MINUTES".to_string(),
            TEST_ACCESS_MINUTES.to_string(),
        ),
        (
            "REFRESH_TOKENS_DURATION_MINUTES".to_string(),
            TEST_REFRESH_MINUTES.to_string(),
        ),
        ("BCRYPT_COST".to_string(), MIN_BCRYPT_COST.to_string()),
        (
            "NOTIFIER_URL".to_string(),
            "http://127.0.0.1:9/notify".to_string(),
        ),
        (
            "AUTH_CONFIRM_ROUTE".to_string(),
            "http://localhost:8080/confirm".to_string(),
        ),
        ("EXTERNAL_CALL_TIMEOUT_SECONDS".to_string(), "2".to_string()),
    ])
}

/// Build a test configuration, applying `overrides` on top of
/// [`test_config_vars`]. An empty override value removes the variable.
pub fn test_config_with(overrides: &[(&str, &str)]) -> Config {
    let mut vars = test_config_vars();
    for (key, value) in overrides {
        if value.is_empty() {
            vars.remove(*key);
        } else {
            vars.insert((*key).to_string(), (*value).to_string());
        }
    }
    Config::from_vars(&vars).expect("test config should be valid")
}

/// Default test configuration.
pub fn test_config() -> Config {
    test_config_with(&[])
}
