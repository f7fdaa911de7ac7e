//! Loading of `config.toml`, `secret.json` and connection settings.
//!
//! Connection fields are resolved with the priority
//! command line > environment (`SQLCHAT_DB_*`) > `config.toml`.
//! The password is never read from `config.toml`.

use std::fs;
use std::path::Path;

use sqlchat_core::config::{AppConfig, DatabaseConfig, SecretConfig};
use sqlchat_core::{ConnectionDescriptor, Result, SqlChatError};

use crate::paths::SqlChatPaths;

pub const ENV_DB_HOST: &str = "SQLCHAT_DB_HOST";
pub const ENV_DB_PORT: &str = "SQLCHAT_DB_PORT";
pub const ENV_DB_USER: &str = "SQLCHAT_DB_USER";
pub const ENV_DB_PASSWORD: &str = "SQLCHAT_DB_PASSWORD";
pub const ENV_DB_SERVICE: &str = "SQLCHAT_DB_SERVICE";

/// Loads `config.toml`.
///
/// With an explicit `path` the file must exist. Without one, the default
/// location is tried and a missing file yields the built-in defaults.
pub fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (SqlChatPaths::config_file()?, false),
    };

    if !path.exists() {
        if required {
            return Err(SqlChatError::config(format!(
                "Configuration file not found at: {}",
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(&path)?;
    let config = AppConfig::from_toml_str(&content).map_err(|e| {
        SqlChatError::config(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Loads `secret.json`; a missing file yields an empty secret config.
pub fn load_secrets(path: Option<&Path>) -> Result<SecretConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => SqlChatPaths::secret_file()?,
    };

    if !path.exists() {
        return Ok(SecretConfig::default());
    }

    let content = fs::read_to_string(&path)?;
    // The error message never contains the file's content.
    serde_json::from_str(&content).map_err(|e| {
        SqlChatError::config(format!(
            "Failed to parse secret file at {}: line {}, column {}",
            path.display(),
            e.line(),
            e.column()
        ))
    })
}

/// Connection fields supplied on the command line.
#[derive(Clone, Default)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub service_name: Option<String>,
}

/// Reads a non-empty environment variable.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Assembles the connection descriptor from all configuration layers.
///
/// `env` is the environment lookup, usually [`env_lookup`].
pub fn resolve_connection<E>(
    file: &DatabaseConfig,
    overrides: ConnectionOverrides,
    env: E,
) -> Result<ConnectionDescriptor>
where
    E: Fn(&str) -> Option<String>,
{
    let env_port = match env(ENV_DB_PORT) {
        Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| {
            SqlChatError::config(format!("{ENV_DB_PORT} is not a valid port: '{raw}'"))
        })?),
        None => None,
    };

    ConnectionDescriptor::from_parts(
        overrides
            .host
            .or_else(|| env(ENV_DB_HOST))
            .or_else(|| file.host.clone()),
        overrides.port.or(env_port).or(file.port),
        overrides
            .user
            .or_else(|| env(ENV_DB_USER))
            .or_else(|| file.user.clone()),
        overrides.password.or_else(|| env(ENV_DB_PASSWORD)),
        overrides
            .service_name
            .or_else(|| env(ENV_DB_SERVICE))
            .or_else(|| file.service_name.clone()),
    )
}
