//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use url::Url;

use crate::integrations::{CallSpec, ClientConfig, ConfiguredIntegration};
use crate::webhooks::GithubProvider;

use super::cli::{Cli, Command};
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::{IntegrationSection, ProviderSection, TomlConfig};

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Address the webhook receiver listens on
    pub bind: SocketAddr,

    /// Path to the webhook store file.
    /// If `None`, records are kept in memory only.
    pub store_path: Option<PathBuf>,

    /// GitHub webhook verification, if configured
    pub github: Option<GithubProvider>,

    /// Third-party APIs available to the `call` command
    pub integrations: BTreeMap<String, ClientConfig>,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self
            .store_path
            .as_ref()
            .map_or_else(|| "memory".to_string(), |p| p.display().to_string());
        let providers = if self.github.is_some() {
            GithubProvider::NAME
        } else {
            "none"
        };
        let integrations: Vec<&str> = self.integrations.keys().map(String::as_str).collect();

        write!(
            f,
            "Config {{ bind: {}, store: {}, providers: [{}], integrations: [{}] }}",
            self.bind,
            store,
            providers,
            integrations.join(", "),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values. Signing
    /// secrets named by `signing_secret_env` are read from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The bind address is invalid
    /// - A provider has no usable signing secret
    /// - An integration has an invalid URL, header, or timeout
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        Self::from_raw_with_env(cli, toml, |name| std::env::var(name).ok())
    }

    /// Like [`from_raw`](Self::from_raw), resolving environment variables
    /// through `env`.
    ///
    /// # Errors
    ///
    /// Same as [`from_raw`](Self::from_raw).
    pub fn from_raw_with_env<E>(
        cli: &Cli,
        toml: Option<&TomlConfig>,
        env: E,
    ) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let bind = Self::resolve_bind(cli, toml)?;
        let store_path = Self::resolve_store_path(cli, toml);

        let github = toml
            .and_then(|t| t.providers.github.as_ref())
            .map(|section| build_github(section, &env))
            .transpose()?;

        let integrations = toml
            .map(|t| &t.integrations)
            .into_iter()
            .flatten()
            .map(|(name, section)| {
                build_integration(name, section).map(|config| (name.clone(), config))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self {
            bind,
            store_path,
            github,
            integrations,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Returns the client configuration of the named integration.
    #[must_use]
    pub fn integration(&self, name: &str) -> Option<&ClientConfig> {
        self.integrations.get(name)
    }

    /// Builds the integration requested by a `call` command.
    ///
    /// Returns `Ok(None)` for any other command.
    ///
    /// # Errors
    ///
    /// Returns an error if the integration is unknown, a `--param` is not
    /// `Key=Value`, or `--body` is not JSON.
    pub fn resolve_call(&self, cli: &Cli) -> Result<Option<ConfiguredIntegration>, ConfigError> {
        let Some(Command::Call {
            integration,
            method,
            path,
            body,
            params,
        }) = &cli.command
        else {
            return Ok(None);
        };

        let config = self
            .integration(integration)
            .ok_or_else(|| ConfigError::UnknownIntegration {
                name: integration.clone(),
            })?;

        let mut call = CallSpec::new((*method).into(), path.clone());
        for param in params {
            let (key, value) = parse_param(param)?;
            call = call.with_param(key, value);
        }
        if let Some(body) = body {
            let value = serde_json::from_str(body).map_err(|e| ConfigError::InvalidBody {
                reason: e.to_string(),
            })?;
            call = call.with_body(value);
        }

        Ok(Some(ConfiguredIntegration::new(
            integration.clone(),
            config.clone(),
            call,
        )))
    }

    fn resolve_bind(cli: &Cli, toml: Option<&TomlConfig>) -> Result<SocketAddr, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let Some(value) = cli
            .bind
            .as_deref()
            .or_else(|| toml.and_then(|t| t.server.bind.as_deref()))
        else {
            return Ok(defaults::BIND);
        };

        value
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidAddress {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    fn resolve_store_path(cli: &Cli, toml: Option<&TomlConfig>) -> Option<PathBuf> {
        // CLI takes precedence
        if let Some(ref path) = cli.store {
            return Some(path.clone());
        }

        toml.and_then(|t| t.store.path.clone())
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn build_github<E>(section: &ProviderSection, env: &E) -> Result<GithubProvider, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let secret = match (&section.signing_secret, &section.signing_secret_env) {
        (Some(_), Some(_)) => {
            return Err(ConfigError::ConflictingSecret {
                provider: GithubProvider::NAME,
            });
        }
        (Some(secret), None) => secret.clone(),
        (None, Some(variable)) => {
            env(variable.as_str())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingSecret {
                    provider: GithubProvider::NAME,
                    variable: variable.clone(),
                })?
        }
        (None, None) => String::new(),
    };

    if secret.is_empty() {
        return Err(ConfigError::missing(
            field::GITHUB_SECRET,
            "Set signing_secret or signing_secret_env under [providers.github]",
        ));
    }

    Ok(GithubProvider::new(secret).with_signing_input(section.signing_input.unwrap_or_default()))
}

fn build_integration(name: &str, section: &IntegrationSection) -> Result<ClientConfig, ConfigError> {
    let base_url = Url::parse(&section.base_url).map_err(|e| ConfigError::InvalidUrl {
        url: section.base_url.clone(),
        reason: e.to_string(),
    })?;

    let mut config = ClientConfig::new(base_url);

    if let Some(ref auth) = section.auth {
        parse_header_value("Authorization", auth)?;
        config = config.with_auth(auth.clone());
    }

    if let Some(ref content_type) = section.content_type {
        parse_header_value("Content-Type", content_type)?;
        config = config.with_content_type(content_type.clone());
    }

    let seconds = section.timeout.unwrap_or(defaults::TIMEOUT_SECS);
    if seconds == 0 {
        return Err(ConfigError::InvalidDuration {
            field: format!("integrations.{name}.timeout"),
            reason: "must be greater than 0".to_string(),
        });
    }
    config = config.with_timeout(Duration::from_secs(seconds));

    let mut headers = HeaderMap::new();
    for (name, value) in &section.headers {
        headers.insert(parse_header_name(name)?, parse_header_value(name, value)?);
    }

    Ok(config.with_headers(headers))
}

fn parse_param(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidParam {
            value: s.to_string(),
        }),
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName, ConfigError> {
    name.parse::<HeaderName>()
        .map_err(|e| ConfigError::InvalidHeaderName {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeaderValue {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
