//! Registry of named client contexts
//!
//! Holds at most one `App` per name. The default context is created with
//! `initialize_app` and may only be created once; other contexts can be
//! fetched-or-created in one step with `get_or_initialize`.

use super::connector::{Connector, RestConnector};
use super::context::App;
use crate::config::{BackendConfig, ConfigError};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the default client context
pub const DEFAULT_APP_NAME: &str = "[DEFAULT]";

/// Name of the isolated context used for account provisioning
pub const SECONDARY_APP_NAME: &str = "secondary";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Client context '{0}' already exists")]
    DuplicateApp(String),

    #[error("No client context named '{0}'")]
    NoApp(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Client context '{0}' already exists with a different configuration")]
    ConfigMismatch(String),

    #[error("Invalid client context name: '{0}'")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Registry keeping one client context per name
pub struct AppRegistry {
    apps: RwLock<HashMap<String, App>>,
    connector: Arc<dyn Connector>,
}

static GLOBAL: OnceLock<AppRegistry> = OnceLock::new();

impl AppRegistry {
    /// Registry connecting to the hosted REST services
    pub fn new() -> Self {
        Self::with_connector(Arc::new(RestConnector::new()))
    }

    /// Registry with a custom backend connector
    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            apps: RwLock::new(HashMap::new()),
            connector,
        }
    }

    /// Process-wide registry (REST connector)
    pub fn global() -> &'static AppRegistry {
        GLOBAL.get_or_init(AppRegistry::new)
    }

    /// Create the default context
    pub fn initialize_app(&self, config: BackendConfig) -> Result<App> {
        self.initialize_named(config, DEFAULT_APP_NAME)
    }

    /// Create a context under `name`; fails if one already exists
    pub fn initialize_named(&self, config: BackendConfig, name: &str) -> Result<App> {
        validate_name(name)?;
        config.validate()?;

        let mut apps = self.apps.write();
        match apps.entry(name.to_string()) {
            Entry::Occupied(_) => Err(AppError::DuplicateApp(name.to_string())),
            Entry::Vacant(slot) => Ok(slot.insert(self.build(config, name)).clone()),
        }
    }

    /// Existing context under `name`
    pub fn app(&self, name: &str) -> Result<App> {
        self.apps
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::NoApp(name.to_string()))
    }

    /// The default context, if created
    pub fn default_app(&self) -> Result<App> {
        self.app(DEFAULT_APP_NAME)
    }

    /// Existing context under `name`, or a new one built from `config`
    ///
    /// Lookup and insertion happen under one write lock. An existing
    /// context created from a different configuration is an error rather
    /// than being silently returned.
    pub fn get_or_initialize(&self, config: BackendConfig, name: &str) -> Result<App> {
        validate_name(name)?;

        let mut apps = self.apps.write();
        match apps.entry(name.to_string()) {
            Entry::Occupied(existing) => {
                if existing.get().config() != &config {
                    return Err(AppError::ConfigMismatch(name.to_string()));
                }
                debug!("Reusing client context '{}'", name);
                Ok(existing.get().clone())
            }
            Entry::Vacant(slot) => {
                config.validate()?;
                Ok(slot.insert(self.build(config, name)).clone())
            }
        }
    }

    /// All live contexts
    pub fn apps(&self) -> Vec<App> {
        self.apps.read().values().cloned().collect()
    }

    /// Remove the context under `name`
    ///
    /// Outstanding handles keep working; the name becomes free for a new
    /// context. Returns whether a context was removed.
    pub fn delete_app(&self, name: &str) -> bool {
        let removed = self.apps.write().remove(name).is_some();
        if removed {
            info!("Deleted client context '{}'", name);
        }
        removed
    }

    fn build(&self, config: BackendConfig, name: &str) -> App {
        let auth_backend = self.connector.auth_backend(&config);
        let store = self.connector.document_store(&config);
        info!(
            "Initialized client context '{}' for project {}",
            name, config.project_id
        );
        App::new(name.to_string(), config, auth_backend, store)
    }
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidName(name.to_string()));
    }
    Ok(())
}
