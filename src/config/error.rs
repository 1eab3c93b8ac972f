//! Everything that can go wrong between argv and a [`ValidatedConfig`](super::ValidatedConfig).

use std::path::PathBuf;

use thiserror::Error;

/// A configuration problem, reported before anything is bound or called.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `--config` file could not be read.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// File involved
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("Invalid config file: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// `init` could not write the template.
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// File involved
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A value with no default was not supplied.
    #[error("{field} is required. {hint}")]
    MissingRequired {
        /// Dotted config key
        field: &'static str,
        /// Where the value can be set
        hint: &'static str,
    },

    /// Invalid listen address.
    #[error("Invalid bind address '{value}': {reason}")]
    InvalidAddress {
        /// The invalid address string
        value: String,
        /// Parser message
        reason: String,
    },

    /// An integration `base_url` does not parse.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// URL as written
        url: String,
        /// Parser message
        reason: String,
    },

    /// A timeout of zero.
    #[error("Invalid {field}: {reason}")]
    InvalidDuration {
        /// Dotted config key
        field: String,
        /// Parser message
        reason: String,
    },

    /// A configured header name is not a valid token.
    #[error("Invalid header name '{name}': {reason}")]
    InvalidHeaderName {
        /// Header name as written
        name: String,
        /// Parser message
        reason: String,
    },

    /// A configured header value has forbidden bytes.
    #[error("Invalid header value for '{name}': {reason}")]
    InvalidHeaderValue {
        /// Header the value belongs to
        name: String,
        /// Parser message
        reason: String,
    },

    /// The environment variable naming a signing secret is unset or empty.
    #[error("Signing secret for provider '{provider}' not found in ${variable}")]
    MissingSecret {
        /// Provider the secret belongs to
        provider: &'static str,
        /// Environment variable that was looked up
        variable: String,
    },

    /// A provider sets both `signing_secret` and `signing_secret_env`.
    #[error("Provider '{provider}' sets both signing_secret and signing_secret_env; use one")]
    ConflictingSecret {
        /// Provider with the conflicting settings
        provider: &'static str,
    },

    /// The `call` command names an integration missing from the config file.
    #[error("Unknown integration '{name}'")]
    UnknownIntegration {
        /// The requested integration name
        name: String,
    },

    /// Invalid `--param` format.
    #[error("Invalid parameter format '{value}': expected 'Key=Value'")]
    InvalidParam {
        /// The invalid parameter string
        value: String,
    },

    /// The `--body` argument is not JSON.
    #[error("Invalid request body: {reason}")]
    InvalidBody {
        /// Parser message
        reason: String,
    },
}

/// Dotted keys reported by [`ConfigError::MissingRequired`].
pub mod field {
    /// The GitHub signing secret field.
    pub const GITHUB_SECRET: &str = "providers.github.signing_secret";
}

impl ConfigError {
    /// Shorthand for [`ConfigError::MissingRequired`].
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }
}
