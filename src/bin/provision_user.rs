//! Create an application user without leaving the admin session
//!
//! Signs the administrator in on the default context, creates the new
//! account on the secondary context and stores its access record.
//!
//! Usage:
//!   cargo run --bin provision_user -- <admin-email> <admin-password> \
//!       <new-email> <new-password> <role> [showroom-id]
//!
//! Roles: admin, showroom (requires showroom-id), client.
//! Pass `--memory` to run against the in-process backend.

use anyhow::{bail, Result};
use comisiones_app::backend_client::{
    init_tracing, AppRegistry, Backend, MemoryConnector, NewUser, Role, UserProvisioner,
};
use comisiones_app::bin_common::{load_config_from_env, parse_args, resolve_backend_config, split_flags, ConfigType};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let (flags, args) = split_flags(parse_args());
    let use_memory = flags.iter().any(|f| f == "--memory");

    if args.len() < 5 {
        bail!("usage: provision_user <admin-email> <admin-password> <new-email> <new-password> <role> [showroom-id]");
    }
    let role: Role = args[4].parse()?;

    let config = resolve_backend_config(&load_config_from_env(ConfigType::Backend))?;
    let registry = if use_memory {
        AppRegistry::with_connector(Arc::new(MemoryConnector::new()))
    } else {
        AppRegistry::new()
    };
    let backend = Backend::initialize(&registry, config)?;

    if use_memory {
        // Fresh in-process project: the admin account doesn't exist yet
        backend
            .auth()
            .create_user_with_email_and_password(&args[0], &args[1])
            .await?;
    } else {
        backend
            .auth()
            .sign_in_with_email_and_password(&args[0], &args[1])
            .await?;
    }

    let provisioner = UserProvisioner::new(backend.clone());
    let created = provisioner
        .provision(NewUser {
            email: args[2].clone(),
            password: args[3].clone(),
            role,
            showroom_id: args.get(5).cloned(),
        })
        .await?;

    info!(
        "Admin session still active: {}",
        backend
            .auth()
            .current_user()
            .and_then(|u| u.email)
            .unwrap_or_default()
    );

    println!();
    println!("USER CREATED:");
    println!("────────────────────────────────────────────────────────────────");
    println!("  Uid:   {}", created.uid);
    println!("  Email: {}", created.record.email);
    println!("  Role:  {}", created.record.role);
    if let Some(showroom) = &created.record.showroom_id {
        println!("  Showroom: {}", showroom);
    }
    println!();

    Ok(())
}
