//! Fixed test identities for deterministic tests

// Account emails
pub const TEST_EMAIL_ALICE: &str = "alice@example.com";
pub const TEST_EMAIL_BOB: &str = "bob@example.com";
pub const TEST_EMAIL_UNKNOWN: &str = "nobody@example.com";

// Passwords
pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";
pub const TEST_WRONG_PASSWORD: &str = "incorrect-horse";

// Response texts
pub const TEXT_SIGNUP_OK: &str = "Successfully signed up! The link is sent to your email";
pub const TEXT_CONFIRM_OK: &str = "Successfully signed up!";
pub const TEXT_AUTHORIZED: &str = "Authorized";
pub const TEXT_ALREADY_REGISTERED: &str = "This email is already registered";
pub const TEXT_ALREADY_PENDING: &str = "User is already pending";
pub const TEXT_NOT_PENDING: &str =
    "This account is not registered yet or token is expired. Try sign up again.";
pub const TEXT_CONFIRMATION_EXPIRED: &str = "Token is expired. Please, sign up again";
pub const TEXT_INVALID_CREDENTIALS: &str = "Can't find user with pair (email, password)";
pub const TEXT_INVALID_TOKEN: &str = "Token is expired or not correct";
pub const TEXT_INTERNAL_ERROR: &str = "An internal error occurred";
