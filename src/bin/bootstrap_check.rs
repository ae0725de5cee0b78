//! Backend bootstrap check
//!
//! Loads the backend configuration, initializes the default and secondary
//! client contexts and prints what was attached.
//!
//! Configuration comes from `BACKEND_CONFIG_PATH` (default
//! `config/backend.yaml`) or, when that file is missing, from the
//! `BACKEND_*` variables in `.env`.
//!
//! Usage:
//!   cargo run --bin bootstrap_check
//!   cargo run --bin bootstrap_check -- --memory   # in-process backend
//!   cargo run --bin bootstrap_check -- --sample   # built-in sample project

use anyhow::Result;
use comisiones_app::backend_client::{init_tracing, AppRegistry, Backend, BackendConfig, MemoryConnector};
use comisiones_app::bin_common::{load_config_from_env, parse_args, resolve_backend_config, split_flags, ConfigType};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let (flags, _) = split_flags(parse_args());
    let use_memory = flags.iter().any(|f| f == "--memory");
    let use_sample = flags.iter().any(|f| f == "--sample");

    println!();
    println!("════════════════════════════════════════════════════════════════");
    println!("BACKEND BOOTSTRAP CHECK");
    println!("════════════════════════════════════════════════════════════════");
    println!();

    let config = if use_sample {
        BackendConfig::sample()
    } else {
        resolve_backend_config(&load_config_from_env(ConfigType::Backend))?
    };
    config.log();

    let registry = if use_memory {
        AppRegistry::with_connector(Arc::new(MemoryConnector::new()))
    } else {
        AppRegistry::new()
    };

    let backend = Backend::initialize(&registry, config)?;

    println!();
    println!("CLIENT CONTEXTS:");
    println!("────────────────────────────────────────────────────────────────");
    for app in registry.apps() {
        println!("  {:<12} project {}", app.name(), app.config().project_id);
    }
    println!();
    println!("  Database:       {}", backend.db().project_id());
    println!("  Auth:           {}", backend.auth().app_name());
    println!("  Secondary auth: {}", backend.secondary_auth().app_name());
    println!();
    println!("════════════════════════════════════════════════════════════════");

    Ok(())
}
