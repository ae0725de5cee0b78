//! Comisiones App - Main Library
//!
//! Backend bootstrap for the commissions application.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, config resolution)
//! - **backend_client**: Client contexts, auth and database access (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use comisiones_app::bin_common::{load_config_from_env, ConfigType};
//! use comisiones_app::backend_client::{AppRegistry, Backend};
//! ```

// Re-export workspace libraries for convenience
pub use backend_client;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;

    pub use cli::{
        load_config_from_env, parse_args, resolve_backend_config, resolve_backend_config_with, split_flags,
        ConfigType,
    };
}
