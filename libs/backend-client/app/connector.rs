use crate::auth::{AuthBackend, IdentityToolkitClient};
use crate::config::BackendConfig;
use crate::firestore::{DocumentStore, FirestoreRestClient};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Builds the service backends a new client context talks to
pub trait Connector: Send + Sync {
    fn auth_backend(&self, config: &BackendConfig) -> Arc<dyn AuthBackend>;

    fn document_store(&self, config: &BackendConfig) -> Arc<dyn DocumentStore>;
}

/// Connector for the hosted REST services (or their emulators)
///
/// Every context built by one connector shares its HTTP connection pool.
#[derive(Clone)]
pub struct RestConnector {
    client: Client,
}

impl RestConnector {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build tuned HTTP client ({}), using defaults", e);
                Client::new()
            });

        Self { client }
    }

    /// Connector over a caller-provided HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for RestConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for RestConnector {
    fn auth_backend(&self, config: &BackendConfig) -> Arc<dyn AuthBackend> {
        Arc::new(IdentityToolkitClient::new(config, self.client.clone()))
    }

    fn document_store(&self, config: &BackendConfig) -> Arc<dyn DocumentStore> {
        Arc::new(FirestoreRestClient::new(config, self.client.clone()))
    }
}
