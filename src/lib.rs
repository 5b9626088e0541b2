//! HTTP gateway for the agro assistant backend.
//!
//! Serves the Groq-backed chatbot at `POST /api/groq/ask-groq/` and relays
//! the admin, auth, insect and plant prefixes to the services behind them.

pub mod api;
pub mod config;
pub mod error;
pub mod forward;
pub mod groq;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::info;

pub use config::{AppConfig, GroqConfig, Upstreams};
pub use error::ApiError;
pub use routes::build_app;

/// Read-only state shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client for the LLM provider.
    pub http: Client,
    /// Client for sub-application traffic; never follows redirects.
    pub forward_http: Client,
    pub groq: GroqConfig,
    pub upstreams: Upstreams,
}

impl AppState {
    pub fn new(config: &AppConfig) -> reqwest::Result<Self> {
        Self::from_parts(config.groq.clone(), config.upstreams.clone())
    }

    pub fn from_parts(groq: GroqConfig, upstreams: Upstreams) -> reqwest::Result<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            forward_http: forward::client()?,
            groq,
            upstreams,
        })
    }
}

pub async fn run_server(app: Router, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    info!(addr = %listener.local_addr()?, "agro gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("agro gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
