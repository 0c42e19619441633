mod routes;
mod webhook;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{config::Config, Error, Result};

pub struct Server {
    addr: String,
}

impl Server {
    pub fn new(config: &Config) -> Self {
        Self {
            addr: config.server.addr.clone(),
        }
    }

    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/health", get(routes::health))
            .route("/metrics", get(routes::metrics))
            .route("/validate-webpinger", post(webhook::validate_webpinger))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until the process receives a shutdown signal.
    pub async fn start(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!(addr = %self.addr, "HTTP server listening");
        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .map_err(Error::Io)
    }
}
