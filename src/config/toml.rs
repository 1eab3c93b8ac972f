//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::webhooks::SigningInput;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Server configuration section
    #[serde(default)]
    pub server: ServerSection,

    /// Webhook store configuration section
    #[serde(default)]
    pub store: StoreSection,

    /// Webhook providers
    #[serde(default)]
    pub providers: ProvidersSection,

    /// Third-party APIs, keyed by name
    #[serde(default)]
    pub integrations: BTreeMap<String, IntegrationSection>,
}

/// Server configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Listen address, e.g. "127.0.0.1:3000"
    pub bind: Option<String>,
}

/// Webhook store configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// Path to the store file; records are kept in memory if unset
    pub path: Option<PathBuf>,
}

/// Webhook providers section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersSection {
    /// GitHub webhooks
    pub github: Option<ProviderSection>,
}

/// Settings of one webhook provider.
#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSection {
    /// Shared secret, inline
    pub signing_secret: Option<String>,

    /// Name of the environment variable holding the shared secret
    pub signing_secret_env: Option<String>,

    /// Which bytes are signed: "raw" or "reserialized"
    pub signing_input: Option<SigningInput>,
}

impl std::fmt::Debug for ProviderSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSection")
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("signing_secret_env", &self.signing_secret_env)
            .field("signing_input", &self.signing_input)
            .finish()
    }
}

/// Settings of one third-party API.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrationSection {
    /// Base URL that call paths are joined onto
    pub base_url: String,

    /// Authorization header value
    pub auth: Option<String>,

    /// Request content type (default: application/json)
    pub content_type: Option<String>,

    /// Connect and read timeout in seconds (default: 30)
    pub timeout: Option<u64>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# hookgate configuration file

[server]
# Listen address (default: 127.0.0.1:3000, can be overridden by --bind)
bind = "127.0.0.1:3000"

[store]
# Webhook store file (can be overridden by --store)
# Records are kept in memory when unset.
# path = "webhooks.json"

[providers.github]
# Shared secret configured on the GitHub webhook.
# Prefer reading it from the environment:
signing_secret_env = "GITHUB_WEBHOOK_SECRET"
# signing_secret = "inline-secret"

# Which bytes are signed: "raw" (request body as received, default)
# or "reserialized" (compact JSON re-serialization of the payload)
# signing_input = "raw"

# Third-party APIs for the `call` command
# [integrations.example]
# base_url = "https://api.example.com/"
# auth = "Bearer your-token-here"
# content_type = "application/json"
# timeout = 30
#
# [integrations.example.headers]
# X-Custom-Header = "value"
"#
    .to_string()
}
