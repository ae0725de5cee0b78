//! Backend bootstrap
//!
//! Creates the default client context, attaches (or reuses) the secondary
//! context, and hands out the three long-lived accessors. The secondary
//! context has its own auth session, so accounts created through it never
//! replace the user signed in on the default context.

use crate::app::{App, AppRegistry, Result, SECONDARY_APP_NAME};
use crate::auth::Auth;
use crate::config::BackendConfig;
use crate::firestore::Firestore;
use tracing::info;

/// Initialized backend handles
#[derive(Debug, Clone)]
pub struct Backend {
    default_app: App,
    secondary_app: App,
    db: Firestore,
    auth: Auth,
    secondary_auth: Auth,
}

impl Backend {
    /// Initialize the default and secondary contexts from one configuration
    ///
    /// Fails if the registry already holds a default context. The secondary
    /// context is reused when present.
    pub fn initialize(registry: &AppRegistry, config: BackendConfig) -> Result<Self> {
        let default_app = registry.initialize_app(config.clone())?;
        let secondary_app = Self::attach_secondary(registry, config)?;

        let backend = Self {
            db: default_app.firestore(),
            auth: default_app.auth(),
            secondary_auth: secondary_app.auth(),
            default_app,
            secondary_app,
        };

        info!(
            "Backend initialized - project: {}",
            backend.config().project_id
        );
        Ok(backend)
    }

    /// Secondary context of `registry`, created on first call
    pub fn attach_secondary(registry: &AppRegistry, config: BackendConfig) -> Result<App> {
        registry.get_or_initialize(config, SECONDARY_APP_NAME)
    }

    pub fn config(&self) -> &BackendConfig {
        self.default_app.config()
    }

    /// Database accessor of the default context
    pub fn db(&self) -> &Firestore {
        &self.db
    }

    /// Auth accessor of the default context
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Auth accessor of the secondary context
    pub fn secondary_auth(&self) -> &Auth {
        &self.secondary_auth
    }

    pub fn default_app(&self) -> &App {
        &self.default_app
    }

    pub fn secondary_app(&self) -> &App {
        &self.secondary_app
    }
}
