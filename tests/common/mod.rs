//! Common test utilities for backend integration tests

use comisiones_app::backend_client::{AppRegistry, MemoryConnector};
use std::sync::Arc;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

#[allow(dead_code)]
/// Registry whose contexts all talk to one fresh in-process project
pub fn memory_registry() -> (AppRegistry, MemoryConnector) {
    let connector = MemoryConnector::new();
    let registry = AppRegistry::with_connector(Arc::new(connector.clone()));
    (registry, connector)
}

/// Check if credentials for a live project are set
#[allow(dead_code)]
pub fn has_live_credentials() -> bool {
    std::env::var("BACKEND_API_KEY").is_ok()
        && std::env::var("BACKEND_PROJECT_ID").is_ok()
        && std::env::var("LIVE_TEST_EMAIL").is_ok()
        && std::env::var("LIVE_TEST_PASSWORD").is_ok()
}
