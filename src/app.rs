//! Process-level plumbing for `main`: exit codes, log setup and
//! hints printed after a configuration error.

use hookgate::config::{ConfigError, field};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Process exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// 0: the server stopped cleanly or the call succeeded.
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - invalid args, bad config file, unknown integration.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - bind failure, corrupt store, failed call.
    ///
    /// Note: This is a function rather than a constant because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// Follows a configuration error with what to do about it, when that is known.
pub fn print_config_hint(error: &ConfigError) {
    match error {
        ConfigError::MissingRequired { field: f, .. } if *f == field::GITHUB_SECRET => {
            eprintln!("\nRun 'hookgate init' to generate a configuration template.");
        }
        ConfigError::FileRead { .. } => {
            eprintln!("\nRun 'hookgate init' to generate a configuration template.");
        }
        ConfigError::MissingSecret { variable, .. } => {
            eprintln!("\nExport {variable} before starting hookgate.");
        }
        ConfigError::UnknownIntegration { .. } => {
            eprintln!("\nDeclare it as [integrations.<name>] in the config file.");
        }
        _ => {}
    }
}

/// Installs the global `tracing` subscriber; `RUST_LOG` overrides the level.
///
/// Logs go to stderr so `hookgate call` output on stdout stays machine-readable.
pub fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
