//! HTTP routes for the auth service.

use crate::errors::AuthError;
use crate::handlers::{self, auth_handler, AppState};
use crate::middleware::http_metrics_middleware;
use axum::{
    error_handling::HandleErrorLayer,
    middleware,
    routing::{get, post, put},
    BoxError, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::trace::TraceLayer;

/// Upper bound on a whole request, above the per-call external timeouts.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build the application routes.
///
/// - `POST /signup`, `GET /confirm` - registration
/// - `PUT /signin`, `PUT /refresh`, `GET /validate` - sessions
/// - `/health` - liveness probe
/// - `/metrics` - Prometheus metrics
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth_handler::handle_signup))
        .route("/confirm", get(auth_handler::handle_confirm))
        .route("/signin", put(auth_handler::handle_signin))
        .route("/refresh", put(auth_handler::handle_refresh))
        .route("/validate", get(auth_handler::handle_validate))
        .route("/health", get(handlers::health_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. TraceLayer (innermost)
    // 2. timeout, rendered as a 408 envelope by HandleErrorLayer
    // 3. http_metrics_middleware (outermost, sees timeouts as 408)
    auth_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS)),
        )
        .layer(middleware::from_fn(http_metrics_middleware))
}

async fn handle_timeout_error(err: BoxError) -> AuthError {
    if err.is::<Elapsed>() {
        AuthError::Timeout
    } else {
        tracing::error!(target: "auth.routes", error = %err, "Unhandled middleware error");
        AuthError::Internal
    }
}
