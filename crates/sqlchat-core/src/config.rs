//! Configuration model.
//!
//! These types mirror `config.toml` and `secret.json`. Loading from disk and
//! environment overrides live in `sqlchat-infrastructure`.

use serde::{Deserialize, Serialize};

use crate::conversation::DEFAULT_GREETING;
use crate::database::DEFAULT_MAX_ROWS;
use crate::dialect::Dialect;
use crate::error::Result;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Root structure of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_completion_url")]
    pub base_url: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_completion_url(),
            max_tokens: None,
            timeout_secs: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_completion_url() -> String {
    DEFAULT_COMPLETION_URL.to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
    #[serde(default)]
    pub dialect: Dialect,
    /// Free-form facts about the data (status code tables, naming conventions).
    #[serde(default)]
    pub domain_notes: Vec<String>,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    /// Rows rendered into the response prompt.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            domain_notes: Vec::new(),
            greeting: default_greeting(),
            max_rows: default_max_rows(),
        }
    }
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

fn default_max_rows() -> usize {
    DEFAULT_MAX_ROWS
}

/// Non-secret connection fields. All optional here; a missing field is
/// reported when the connection descriptor is assembled.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub service_name: Option<String>,
}

/// Root structure of `secret.json`.
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct SecretConfig {
    #[serde(default)]
    pub openai: Option<OpenAiSecret>,
}

/// OpenAI-compatible API credentials.
#[derive(Deserialize, Serialize, Clone)]
pub struct OpenAiSecret {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

impl std::fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretConfig")
            .field("openai", &self.openai.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
