//! Integration tests for backend bootstrap
//!
//! Runs the full bootstrap against the in-process backend: context
//! creation, secondary reuse, and session isolation between the default
//! and secondary auth accessors.

mod common;

use comisiones_app::backend_client::{
    AppError, Backend, BackendConfig, DEFAULT_APP_NAME, SECONDARY_APP_NAME,
};
use common::memory_registry;
use serde_json::json;

#[test]
fn test_single_initialize_creates_two_contexts() {
    let (registry, _) = memory_registry();
    let backend = Backend::initialize(&registry, BackendConfig::sample()).unwrap();

    let mut names: Vec<String> = registry.apps().iter().map(|a| a.name().to_string()).collect();
    names.sort();
    assert_eq!(names, vec![DEFAULT_APP_NAME, SECONDARY_APP_NAME]);

    let default_app = registry.app(DEFAULT_APP_NAME).unwrap();
    let secondary_app = registry.app(SECONDARY_APP_NAME).unwrap();
    assert_eq!(default_app.config(), secondary_app.config());
    assert!(backend.default_app().ptr_eq(&default_app));
}

#[test]
fn test_secondary_step_is_idempotent() {
    let (registry, _) = memory_registry();
    let backend = Backend::initialize(&registry, BackendConfig::sample()).unwrap();

    // Simulated reload of the bootstrap module
    let again = Backend::attach_secondary(&registry, BackendConfig::sample()).unwrap();
    let once_more = Backend::attach_secondary(&registry, BackendConfig::sample()).unwrap();

    assert!(again.ptr_eq(backend.secondary_app()));
    assert!(once_more.ptr_eq(&again));
    assert!(again.auth().ptr_eq(backend.secondary_auth()));
    assert_eq!(registry.apps().len(), 2);
}

#[test]
fn test_sample_config_binds_handles_to_project() {
    let (registry, _) = memory_registry();
    let backend = Backend::initialize(&registry, BackendConfig::sample()).unwrap();

    assert_eq!(backend.config().project_id, "comisiones-app-33035");
    assert_eq!(backend.config().app_id, "1:788824483061:web:426710fdd532d64e53d1bc");
    assert_eq!(backend.db().project_id(), "comisiones-app-33035");
    assert_eq!(backend.auth().project_id(), "comisiones-app-33035");
    assert_eq!(backend.secondary_auth().project_id(), "comisiones-app-33035");
}

#[test]
fn test_missing_field_fails_unrecovered() {
    let (registry, _) = memory_registry();
    let mut config = BackendConfig::sample();
    config.messaging_sender_id.clear();

    let err = Backend::initialize(&registry, config).unwrap_err();
    assert!(matches!(err, AppError::InvalidConfig(_)));
    assert!(registry.apps().is_empty());
}

#[test]
fn test_default_context_cannot_be_recreated() {
    let (registry, _) = memory_registry();
    Backend::initialize(&registry, BackendConfig::sample()).unwrap();

    let err = registry.initialize_app(BackendConfig::sample()).unwrap_err();
    assert!(matches!(err, AppError::DuplicateApp(_)));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let (registry, connector) = memory_registry();
    let backend = Backend::initialize(&registry, BackendConfig::sample()).unwrap();

    backend
        .auth()
        .create_user_with_email_and_password("admin@example.com", "admin-pass")
        .await
        .unwrap();

    let created = backend
        .secondary_auth()
        .create_user_with_email_and_password("showroom@example.com", "showroom-pass")
        .await
        .unwrap();
    verbose_println!("created {}", created.user.uid);

    // Admin is still the default user
    let admin = backend.auth().current_user().unwrap();
    assert_eq!(admin.email.as_deref(), Some("admin@example.com"));
    assert_eq!(backend.secondary_auth().current_user(), Some(created.user.clone()));

    backend.secondary_auth().sign_out();
    assert!(backend.secondary_auth().current_user().is_none());
    assert_eq!(backend.auth().current_user(), Some(admin));

    // Both contexts share one project
    assert_eq!(connector.project().account_count(), 2);
    backend
        .auth()
        .sign_in_with_email_and_password("showroom@example.com", "showroom-pass")
        .await
        .unwrap();
    assert_eq!(backend.auth().current_user().unwrap().uid, created.user.uid);
}

#[tokio::test]
async fn test_database_uses_default_session() {
    use comisiones_app::backend_client::MemoryProject;
    use comisiones_app::backend_client::{AppRegistry, MemoryConnector};
    use std::sync::Arc;

    let project = Arc::new(MemoryProject::with_auth_required());
    let registry = AppRegistry::with_connector(Arc::new(MemoryConnector::with_project(project.clone())));
    let backend = Backend::initialize(&registry, BackendConfig::sample()).unwrap();
    let doc = backend.db().collection("data").doc("orders");

    // Signed in only on the secondary context: database still anonymous
    backend
        .secondary_auth()
        .create_user_with_email_and_password("new@example.com", "secret1")
        .await
        .unwrap();
    assert!(doc.set(&json!({ "items": [] })).await.is_err());

    backend
        .auth()
        .create_user_with_email_and_password("admin@example.com", "secret1")
        .await
        .unwrap();
    doc.set(&json!({ "items": [1, 2, 3] })).await.unwrap();
    assert_eq!(project.document("data", "orders").unwrap()["items"], json!([1, 2, 3]));
}
