//! Backend Client
//!
//! Client-side bootstrap for a hosted backend project: a document database
//! and an authentication service, reached through named client contexts.
//!
//! ## Layout
//!
//! - **config**: the project configuration record and its loaders
//! - **app**: client contexts and the registry that keeps one per name
//! - **auth**: per-context authentication accessor and its REST backend
//! - **firestore**: document database accessor and its REST backend
//! - **memory**: in-process backend for tests and offline runs
//! - **bootstrap**: default + secondary context initialization
//! - **provisioning**: admin-side user provisioning over the secondary context
//! - **utils**: tracing setup

pub mod app;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod firestore;
pub mod memory;
pub mod provisioning;
pub mod utils;

// Re-export commonly used items
pub use app::{App, AppError, AppRegistry, Connector, RestConnector, DEFAULT_APP_NAME, SECONDARY_APP_NAME};
pub use auth::{Auth, AuthError, User, UserCredential};
pub use bootstrap::Backend;
pub use config::{BackendConfig, ConfigError, EmulatorConfig};
pub use firestore::{
    CollectionRef, DocumentRef, DocumentSnapshot, Firestore, FirestoreError, Query, QuerySnapshot,
};
pub use memory::{MemoryConnector, MemoryProject};
pub use provisioning::{Access, NewUser, ProvisionError, ProvisionedUser, Role, UserProvisioner, UserRecord};
pub use utils::init_tracing;
