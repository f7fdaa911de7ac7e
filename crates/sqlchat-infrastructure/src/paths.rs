//! Path management for sqlchat configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/sqlchat/           # Config directory (platform config dir)
//! ├── config.toml              # Application configuration
//! └── secret.json              # API keys
//! ```

use std::path::PathBuf;

use sqlchat_core::{Result, SqlChatError};

const APP_DIR: &str = "sqlchat";

pub struct SqlChatPaths;

impl SqlChatPaths {
    /// Returns the sqlchat configuration directory (e.g. `~/.config/sqlchat/`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| SqlChatError::config("Cannot find configuration directory"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("secret.json"))
    }
}
