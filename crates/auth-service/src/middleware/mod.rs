pub mod delegated_auth;
pub mod http_metrics;

pub use delegated_auth::{require_remote_validation, GateState};
pub use http_metrics::http_metrics_middleware;
