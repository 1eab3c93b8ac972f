//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::integrations::CallMethod;

/// hookgate: verified webhook intake and third-party API calls
///
/// Receives HMAC-signed webhooks, records each delivery once, and makes
/// one-off calls against configured third-party APIs.
#[derive(Debug, Parser)]
#[command(name = "hookgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run (default: serve)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, global = true)]
    pub bind: Option<String>,

    /// Path to the webhook store file (records are kept in memory if unset)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for hookgate
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the webhook receiver
    Serve,

    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = super::defaults::CONFIG_FILE)]
        output: PathBuf,
    },

    /// Make one call against a configured integration and print the result
    Call {
        /// Name of the `[integrations.<name>]` table
        integration: String,

        /// Request method
        #[arg(value_enum, ignore_case = true)]
        method: MethodArg,

        /// Path joined onto the integration's base URL
        path: String,

        /// JSON request body (POST and PUT)
        #[arg(long)]
        body: Option<String>,

        /// Query parameter in 'Key=Value' format (can be specified multiple times)
        #[arg(long = "param", value_name = "K=V")]
        params: Vec<String>,
    },
}

/// Request method argument for the `call` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// GET with query parameters
    Get,
    /// POST with a body
    Post,
    /// PUT with a body
    Put,
    /// DELETE with query parameters
    Delete,
}

impl From<MethodArg> for CallMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Get => Self::Get,
            MethodArg::Post => Self::Post,
            MethodArg::Put => Self::Put,
            MethodArg::Delete => Self::Delete,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }

    /// Returns true if this is the call command.
    #[must_use]
    pub const fn is_call(&self) -> bool {
        matches!(self.command, Some(Command::Call { .. }))
    }
}
