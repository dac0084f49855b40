//! Control-plane HTTP server: health probes and Prometheus metrics.

use crate::infrastructure::config::ServerSettings;
use crate::mesh::RegistrationMonitor;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::Future;
use std::net::SocketAddr;

async fn health_live() -> &'static str {
    "OK"
}

/// Readiness follows the registration: ready while the mesh can route here.
async fn health_ready(State(monitor): State<RegistrationMonitor>) -> impl IntoResponse {
    let state = monitor.snapshot();
    let code = if state.status.is_routable() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(state))
}

/// Health routes, without the metrics endpoint.
pub fn health_router(monitor: RegistrationMonitor) -> Router {
    Router::new()
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .with_state(monitor)
}

/// Runs the control plane HTTP server until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed or the
/// server fails to bind or run.
pub async fn run_server(
    config: &ServerSettings,
    monitor: RegistrationMonitor,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {e}"))?;

    let app = health_router(monitor)
        .route("/metrics", get(move || std::future::ready(handle.render())));

    let addr: SocketAddr = config.bind_address().to_socket_addr()?;
    tracing::info!(%addr, "Control plane listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
