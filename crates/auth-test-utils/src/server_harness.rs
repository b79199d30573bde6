//! Test server harness for E2E testing
//!
//! Provides TestAuthServer for spawning real auth service instances in tests.
//! The account store is in memory and the notifier records messages instead
//! of sending them, so no external services are needed.

use crate::fixtures::test_config;
use auth_service::config::Config;
use auth_service::crypto::PasswordHasher;
use auth_service::handlers::AppState;
use auth_service::models::{Account, AccountSet};
use auth_service::observability::metrics::init_metrics_recorder;
use auth_service::repositories::accounts::mock::InMemoryAccountStore;
use auth_service::routes;
use auth_service::services::notifier::mock::MockNotifier;
use auth_service::services::{RegistrationService, SessionService, TokenIssuer};
use common::types::TokenPair;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the auth service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_signup_flow() -> Result<()> {
///     let server = TestAuthServer::spawn().await?;
///
///     let response = server
///         .client()
///         .post(format!("{}/signup", server.url()))
///         .json(&json!({"email": "a@x.com", "password": "p1"}))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAuthServer {
    addr: SocketAddr,
    config: Config,
    store: InMemoryAccountStore,
    notifier: MockNotifier,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestAuthServer {
    /// Spawn a server with the default test configuration.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_config(test_config()).await
    }

    /// Spawn a server with a custom configuration.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Use a fresh in-memory account store and recording notifier
    /// - Start the HTTP server in the background
    pub async fn spawn_with_config(config: Config) -> Result<Self, anyhow::Error> {
        let store = InMemoryAccountStore::new();
        let notifier = MockNotifier::accepting();
        let issuer = TokenIssuer::new(&config);

        let state = Arc::new(AppState {
            registration: RegistrationService::new(
                &config,
                Arc::new(store.clone()),
                Arc::new(notifier.clone()),
            ),
            sessions: SessionService::new(&config, Arc::new(store.clone()), issuer),
        });

        // The global recorder can only be installed once per process; later
        // servers get a standalone recorder.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                PrometheusBuilder::new().build_recorder().handle()
            }
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            store,
            notifier,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The server's account store
    pub fn store(&self) -> &InMemoryAccountStore {
        &self.store
    }

    /// The server's notifier
    pub fn notifier(&self) -> &MockNotifier {
        &self.notifier
    }

    /// Shared HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// A token issuer sharing the server's secret and durations.
    pub fn issuer(&self) -> TokenIssuer {
        TokenIssuer::new(&self.config)
    }

    /// Seed an active account directly into the store.
    pub fn create_active_account(&self, email: &str, password: &str) -> Result<(), anyhow::Error> {
        let hasher = PasswordHasher::new(self.config.bcrypt_cost);
        self.store.seed(
            AccountSet::Active,
            Account {
                email: email.to_string(),
                password_hash: hasher.hash(password)?,
                confirm_token: None,
                created_at: chrono::Utc::now().timestamp(),
            },
        );
        Ok(())
    }

    /// Sign in over HTTP and return the issued pair.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<TokenPair, anyhow::Error> {
        let response = self
            .client
            .put(format!("{}/signin", self.url()))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Sign-in failed with status {}", response.status());
        }
        Ok(response.json().await?)
    }
}

impl Drop for TestAuthServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
