use std::sync::Arc;

use anyhow::Context;
use kube::Client;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use webpinger_operator::{
    config::Config,
    controllers::WebPingerController,
    kubernetes::KubeStore,
    metrics,
    server::Server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("webpinger_operator=info,info")),
        )
        .init();

    let config = Config::load().context("failed to load configuration")?;
    info!(?config, "Loaded configuration");

    metrics::register_metrics()?;

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    let server = Server::new(&config);
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.start().await {
            error!(error = %e, "HTTP server failed");
        }
    });

    let controller = Arc::new(WebPingerController::new(
        Arc::new(KubeStore::new(client.clone())),
        config.worker.clone(),
        config.controller.retry_delay(),
    ));
    controller
        .run(client, config.controller.namespace.clone())
        .await?;

    server_task.abort();
    info!("Shutting down");
    Ok(())
}
