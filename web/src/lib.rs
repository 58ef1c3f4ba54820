//! HTTP surface of the relay: the stream endpoint clients hold open, the
//! ingestion endpoint the origin application fires notifications at, and the
//! health endpoint supervisors poll.

use log::*;
use std::sync::Arc;

mod controller;
mod error;
pub mod router;
mod stream;

pub use error::Error;

use fanout::Manager;
use service::config::Config;

// Web-level state: infrastructure state plus the fanout manager shared by
// the stream handler and the ingestion controller.
#[derive(Clone)]
pub struct AppState {
    service_state: service::AppState,
    pub relay_manager: Arc<Manager>,
}

impl AppState {
    pub fn new(service_state: service::AppState, relay_manager: Arc<Manager>) -> Self {
        Self {
            service_state,
            relay_manager,
        }
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }
}

/// Bind the configured interface and serve until SIGINT/SIGTERM.
///
/// A restart drops every open stream connection - clients are expected to
/// reconnect - and loses no durable data because none is held.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let host = app_state
        .config()
        .interface
        .as_deref()
        .unwrap_or("127.0.0.1");
    let addr = format!("{}:{}", host, app_state.config().port);

    let router = router::define_routes(app_state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Relay listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, dropping open connections");
}
