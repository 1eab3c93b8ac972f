//! Application execution logic.
//!
//! `serve` runs the webhook receiver until a shutdown signal arrives;
//! `call` performs one configured integration call and prints its envelope.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;

use hookgate::config::ValidatedConfig;
use hookgate::integrations::{ApiResponse, ConfiguredIntegration, HttpError, OneShotCall};
use hookgate::server;
use hookgate::webhooks::{
    FileWebhookStore, GithubProvider, MemoryWebhookStore, StoreError, WebhookIntake, WebhookStore,
};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to bind the listen address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Requested listen address
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    /// Failed to open the webhook store.
    #[error("Failed to open webhook store: {0}")]
    Store(#[from] StoreError),

    /// Failed to build the HTTP client.
    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] HttpError),

    /// Failed to render the call result.
    #[error("Failed to render response: {0}")]
    Render(#[from] serde_json::Error),

    /// The call completed with a failure envelope.
    #[error("Call failed with status {status}: {message}")]
    CallFailed {
        /// Envelope status
        status: u16,
        /// Envelope error message
        message: String,
    },
}

/// Runs the webhook receiver until Ctrl+C or SIGTERM.
///
/// Records are kept in memory unless a store path is configured.
///
/// # Errors
///
/// Returns an error if the store file cannot be opened, the address cannot
/// be bound, or the server fails.
#[cfg(not(tarpaulin_include))]
pub async fn serve(config: ValidatedConfig) -> Result<(), RunError> {
    match config.store_path.clone() {
        Some(path) => {
            let store = FileWebhookStore::open(&path)?;
            tracing::info!(
                "Webhook store: {} ({} record(s))",
                path.display(),
                store.count().await
            );
            serve_with(Arc::new(store), config).await
        }
        None => {
            tracing::warn!("No store path configured, records are kept in memory only");
            serve_with(Arc::new(MemoryWebhookStore::new()), config).await
        }
    }
}

#[cfg(not(tarpaulin_include))]
async fn serve_with<S: WebhookStore + 'static>(
    store: Arc<S>,
    config: ValidatedConfig,
) -> Result<(), RunError> {
    let intake = Arc::new(build_intake(store, config.github));

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| RunError::Bind {
            addr: config.bind,
            source,
        })?;

    server::serve(listener, server::router(intake), async {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping...");
    })
    .await
    .map_err(RunError::Serve)
}

/// Builds the intake with every configured provider.
fn build_intake<S: WebhookStore>(
    store: Arc<S>,
    github: Option<GithubProvider>,
) -> WebhookIntake<S> {
    let mut intake = WebhookIntake::new(store);

    if let Some(github) = github {
        intake = intake.with_provider(github);
    }

    let providers = intake.provider_names();
    if providers.is_empty() {
        tracing::warn!("No webhook providers configured, every delivery will be rejected");
    } else {
        tracing::info!("Webhook providers: {}", providers.join(", "));
    }

    intake
}

/// Performs one call and prints the resulting envelope to stdout.
///
/// # Errors
///
/// Returns [`RunError::CallFailed`] if the envelope is a failure; the
/// envelope itself is still printed.
#[cfg(not(tarpaulin_include))]
pub async fn call(integration: ConfiguredIntegration) -> Result<(), RunError> {
    let call = OneShotCall::with_reqwest(integration)?;
    let response = call.execute().await;

    println!("{}", render_response(response)?);
    check_response(response)
}

/// Pretty-prints an envelope as JSON.
fn render_response(response: &ApiResponse) -> Result<String, RunError> {
    Ok(serde_json::to_string_pretty(response)?)
}

/// Maps a failure envelope to an error.
fn check_response(response: &ApiResponse) -> Result<(), RunError> {
    if response.is_success() {
        return Ok(());
    }

    Err(RunError::CallFailed {
        status: response.status(),
        message: response.error_message().unwrap_or_default().to_string(),
    })
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
