//! CLI utilities for binaries
//!
//! Handles configuration loading and environment variables
//! for all binary executables.

use backend_client::{BackendConfig, ConfigError};
use std::path::{Path, PathBuf};
use tracing::info;

/// Type of configuration to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Backend project configuration (backend.yaml)
    Backend,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Backend => "config/backend.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        match self {
            ConfigType::Backend => "BACKEND_CONFIG_PATH",
            ConfigType::Custom(_) => "BACKEND_CONFIG_PATH",
        }
    }
}

/// Load configuration path from environment or use default
///
/// A `Custom` path always wins over the environment.
///
/// # Examples
/// ```
/// use comisiones_app::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Custom("my.yaml".to_string()));
/// assert_eq!(path.to_str(), Some("my.yaml"));
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    if let ConfigType::Custom(path) = &config_type {
        return PathBuf::from(path);
    }

    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Resolve the backend configuration
///
/// Reads the YAML file when it exists, otherwise builds the record from
/// `BACKEND_*` environment variables.
pub fn resolve_backend_config(path: &Path) -> Result<BackendConfig, ConfigError> {
    dotenv::dotenv().ok();
    resolve_backend_config_with(path, |key| std::env::var(key).ok())
}

/// Resolve the backend configuration against an explicit variable lookup
pub fn resolve_backend_config_with<F>(path: &Path, get: F) -> Result<BackendConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if path.exists() {
        info!("Loading backend configuration from {:?}", path);
        BackendConfig::load_with(path, get)
    } else {
        info!("{:?} not found, reading backend configuration from environment", path);
        let config = BackendConfig::from_vars(get)?;
        config.validate()?;
        Ok(config)
    }
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// Split `--flag` switches from positional arguments
pub fn split_flags(args: Vec<String>) -> (Vec<String>, Vec<String>) {
    args.into_iter().partition(|a| a.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_type_paths() {
        assert_eq!(ConfigType::Backend.default_path(), "config/backend.yaml");

        let custom = ConfigType::Custom("custom/path.yaml".to_string());
        assert_eq!(custom.default_path(), "custom/path.yaml");
    }

    #[test]
    fn test_config_type_env_vars() {
        assert_eq!(ConfigType::Backend.env_var_name(), "BACKEND_CONFIG_PATH");
    }

    #[test]
    fn test_split_flags() {
        let args = vec!["--memory".to_string(), "a@example.com".to_string()];
        let (flags, positional) = split_flags(args);
        assert_eq!(flags, vec!["--memory"]);
        assert_eq!(positional, vec!["a@example.com"]);
    }
}
