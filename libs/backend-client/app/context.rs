use crate::auth::{Auth, AuthBackend};
use crate::config::BackendConfig;
use crate::firestore::{DocumentStore, Firestore};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Client context: one named connection scope to a backend project
///
/// Cheap to clone; clones are the same context. The auth and database
/// accessors are created on first use and then shared by every clone.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    name: String,
    config: BackendConfig,
    auth_backend: Arc<dyn AuthBackend>,
    store: Arc<dyn DocumentStore>,
    auth: OnceLock<Auth>,
    firestore: OnceLock<Firestore>,
}

impl App {
    pub(crate) fn new(
        name: String,
        config: BackendConfig,
        auth_backend: Arc<dyn AuthBackend>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppInner {
                name,
                config,
                auth_backend,
                store,
                auth: OnceLock::new(),
                firestore: OnceLock::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Configuration this context was created with
    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    /// Authentication accessor of this context
    pub fn auth(&self) -> Auth {
        self.inner
            .auth
            .get_or_init(|| {
                Auth::new(
                    self.inner.name.clone(),
                    self.inner.config.project_id.clone(),
                    Arc::clone(&self.inner.auth_backend),
                )
            })
            .clone()
    }

    /// Database accessor of this context
    pub fn firestore(&self) -> Firestore {
        self.inner
            .firestore
            .get_or_init(|| {
                Firestore::new(
                    self.inner.config.project_id.clone(),
                    Arc::clone(&self.inner.store),
                    self.auth(),
                )
            })
            .clone()
    }

    /// Whether two handles are the same context
    pub fn ptr_eq(&self, other: &App) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.inner.name)
            .field("project_id", &self.inner.config.project_id)
            .finish()
    }
}
