//! Metrics definitions for the auth service
//!
//! All metrics follow Prometheus naming conventions:
//! - `auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `status`: `success` or one of the three error categories
//! - `kind`: `access`, `refresh`
//! - `operation`: `find`, `insert`, `delete`, `promote`
//! - `set`: `pending`, `active`
//! - `path`: the fixed route table, everything else is `/other`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder.
///
/// Fails if a recorder is already installed in this process.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // External call buckets span the configured timeout (default 5s)
        .set_buckets_for_metric(
            Matcher::Prefix("auth_store".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set store call buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("auth_notification".to_string()),
            &[0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000],
        )
        .map_err(|e| format!("Failed to set notification buckets: {e}"))?
        // bcrypt dominates request latency; coarse buckets
        .set_buckets_for_metric(
            Matcher::Prefix("auth_http_request".to_string()),
            &[0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Account Lifecycle Metrics
// ============================================================================

/// Metric: `auth_signups_total`
/// Labels: `status`
pub fn record_signup(status: &str) {
    counter!("auth_signups_total", "status" => status.to_string()).increment(1);
}

/// Metric: `auth_confirmations_total`
/// Labels: `status`
pub fn record_confirmation(status: &str) {
    counter!("auth_confirmations_total", "status" => status.to_string()).increment(1);
}

/// Metric: `auth_signins_total`
/// Labels: `status`
pub fn record_signin(status: &str) {
    counter!("auth_signins_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Metric: `auth_token_issuance_total`
/// Labels: `kind`
pub fn record_token_issuance(kind: &str) {
    counter!("auth_token_issuance_total", "kind" => kind.to_string()).increment(1);
}

/// Metric: `auth_token_validations_total`
/// Labels: `kind`, `status`
pub fn record_token_validation(kind: &str, status: &str) {
    counter!("auth_token_validations_total", "kind" => kind.to_string(), "status" => status.to_string())
        .increment(1);
}

// ============================================================================
// External Call Metrics
// ============================================================================

/// Metric: `auth_notifications_total`, `auth_notification_duration_seconds`
/// Labels: `status`
pub fn record_notification(status: &str, duration: Duration) {
    histogram!("auth_notification_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());
    counter!("auth_notifications_total", "status" => status.to_string()).increment(1);
}

/// Metric: `auth_store_calls_total`, `auth_store_call_duration_seconds`
/// Labels: `operation`, `set`, `status`
pub fn record_store_call(operation: &str, set: &str, status: &str, duration: Duration) {
    histogram!("auth_store_call_duration_seconds", "operation" => operation.to_string(), "set" => set.to_string())
        .record(duration.as_secs_f64());

    counter!("auth_store_calls_total", "operation" => operation.to_string(), "set" => set.to_string(), "status" => status.to_string())
        .increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Metric: `auth_http_requests_total`, `auth_http_request_duration_seconds`
/// Labels: `method`, `path`, `status_code`
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let normalized_path = normalize_path(path);

    histogram!("auth_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => normalized_path,
        "status_code" => status_code.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("auth_http_requests_total",
        "method" => method.to_string(),
        "path" => normalized_path,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn normalize_path(path: &str) -> &'static str {
    match path {
        "/signup" => "/signup",
        "/signin" => "/signin",
        "/refresh" => "/refresh",
        "/validate" => "/validate",
        "/confirm" => "/confirm",
        "/health" => "/health",
        "/metrics" => "/metrics",
        _ => "/other",
    }
}
