//! Live tests against a real backend project
//!
//! These tests require credentials and talk to the hosted services (or
//! emulators, when `BACKEND_*_EMULATOR_HOST` is set). They are marked
//! with #[ignore] and should be run explicitly:
//!
//! ```bash
//! export BACKEND_API_KEY="..." BACKEND_PROJECT_ID="..."   # plus the other BACKEND_* fields
//! export LIVE_TEST_EMAIL="..." LIVE_TEST_PASSWORD="..."
//! cargo test --test live_backend -- --ignored
//! ```

mod common;

use comisiones_app::backend_client::{AppRegistry, Backend, BackendConfig};

/// Skip test if no credentials
macro_rules! require_credentials {
    () => {
        if !common::has_live_credentials() {
            println!("Skipping: live credentials not available");
            return;
        }
    };
}

#[tokio::test]
#[ignore]
async fn test_live_sign_in_and_read() {
    require_credentials!();

    let config = BackendConfig::from_env().expect("BACKEND_* variables");
    let registry = AppRegistry::new();
    let backend = Backend::initialize(&registry, config).unwrap();

    let email = std::env::var("LIVE_TEST_EMAIL").unwrap();
    let password = std::env::var("LIVE_TEST_PASSWORD").unwrap();
    let credential = backend
        .auth()
        .sign_in_with_email_and_password(&email, &password)
        .await
        .unwrap();
    verbose_println!("Signed in as {}", credential.user.uid);

    let snapshot = backend
        .db()
        .collection("users")
        .doc(&credential.user.uid)
        .get()
        .await
        .unwrap();
    verbose_println!("Access record exists: {}", snapshot.exists());

    assert!(backend.secondary_auth().current_user().is_none());
}
