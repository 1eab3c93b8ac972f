//! HTTP surface of the webhook receiver.
//!
//! Routes:
//! - `POST /inbound_webhooks/{provider}`: verify and record one delivery
//! - `GET /health`: liveness probe answering `OK`
//!
//! Webhook responses never carry a body; the status code is the whole answer.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::routing::{get, post};
use http::{Extensions, HeaderMap, StatusCode};
use tokio::net::TcpListener;

use crate::webhooks::{WebhookIntake, WebhookStore};

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;

/// Builds the application router around `intake`.
pub fn router<S: WebhookStore + 'static>(intake: Arc<WebhookIntake<S>>) -> Router {
    Router::new()
        .route("/inbound_webhooks/{provider}", post(receive_webhook::<S>))
        .route("/health", get(health))
        .with_state(intake)
}

/// Serves `router` on `listener` until `shutdown` completes.
///
/// Peer addresses are attached to each request so recorded webhooks carry
/// their source IP.
///
/// # Errors
///
/// Returns an I/O error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on http://{addr}");
    }

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

async fn receive_webhook<S: WebhookStore>(
    State(intake): State<Arc<WebhookIntake<S>>>,
    Path(provider): Path<String>,
    extensions: Extensions,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let source_ip = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    intake
        .receive(&provider, &headers, source_ip, &body)
        .await
        .status_code()
}

async fn health() -> &'static str {
    "OK"
}
