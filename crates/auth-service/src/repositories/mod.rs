pub mod accounts;

pub use accounts::{AccountStore, PgAccountStore};

use crate::errors::AuthError;
use crate::models::AccountSet;
use crate::observability::{metrics, outcome};
use std::future::Future;
use std::time::{Duration, Instant};

/// Run a store call under `timeout`, recording its duration and outcome.
///
/// An elapsed timeout is reported as `AuthError::Database`; the inner
/// future is dropped, which cancels the query.
pub async fn bounded<T, F>(
    timeout: Duration,
    operation: &'static str,
    set: AccountSet,
    call: F,
) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, AuthError>>,
{
    let start = Instant::now();
    let result = match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                target: "auth.repositories",
                operation,
                set = set.as_str(),
                timeout_ms = timeout.as_millis() as u64,
                "Account store call timed out"
            );
            Err(AuthError::Database(format!(
                "{} on {} accounts timed out",
                operation,
                set.as_str()
            )))
        }
    };

    metrics::record_store_call(operation, set.as_str(), outcome(&result), start.elapsed());
    result
}
