//! Configuration layer for hookgate.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! `bind` and `store` are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - `--bind`, `--store`
//! 2. **TOML config file** - `server.bind`, `store.path`
//! 3. **Built-in defaults** - `127.0.0.1:3000`, in-memory store
//!
//! Providers and integrations are configured only in the TOML file.
//!
//! # Secrets
//!
//! A provider's signing secret is either inline (`signing_secret`) or read
//! from the environment variable named by `signing_secret_env`. Setting
//! both is an error. Secrets never appear in `Display` or `Debug` output.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;


pub use cli::{Cli, Command, MethodArg};
pub use error::{ConfigError, field};
pub use toml::{TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
