use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, PostParams},
    Client,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use webpinger_operator::probe::{build_http_client, encode_condition, ping, ping_url, PodIdentity};
use webpinger_operator::protocol::{
    BASE_URL_ENV, DEFAULT_NAMESPACE_PATH, DEFAULT_POD_NAME_PATH, NAMESPACE_FILEPATH_ENV,
    POD_NAME_FILEPATH_ENV,
};

/// Ping an endpoint once and record the outcome on this worker's own pod.
#[derive(Parser, Debug)]
#[command(name = "webping", version)]
struct Cli {
    /// Path appended to the base URL
    endpoint: String,

    #[arg(long, env = BASE_URL_ENV)]
    base_url: String,

    /// File holding this pod's name, written by the downward API
    #[arg(long, env = POD_NAME_FILEPATH_ENV, default_value = DEFAULT_POD_NAME_PATH)]
    pod_name_filepath: PathBuf,

    /// File holding this pod's namespace, written by the downward API
    #[arg(long, env = NAMESPACE_FILEPATH_ENV, default_value = DEFAULT_NAMESPACE_PATH)]
    namespace_filepath: PathBuf,

    #[arg(long, env = "PING_TIMEOUT_SECONDS", default_value_t = 30)]
    timeout_seconds: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Identity is read before anything goes over the network.
    let identity = PodIdentity::from_files(&cli.pod_name_filepath, &cli.namespace_filepath)
        .context("failed to read pod identity")?;

    let url = ping_url(&cli.base_url, &cli.endpoint)?;
    let http = build_http_client(Duration::from_secs(cli.timeout_seconds))?;
    let condition = ping(&http, &url).await;
    info!(
        url = %url,
        condition_type = ?condition.condition_type,
        status = condition.status,
        reason = ?condition.reason,
        "Ping finished"
    );

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    let pods: Api<Pod> = Api::namespaced(client, &identity.namespace);
    let mut pod = pods
        .get(&identity.name)
        .await
        .with_context(|| format!("failed to get pod {}/{}", identity.namespace, identity.name))?;

    encode_condition(&condition, &mut pod.metadata);
    pods.replace(&identity.name, &PostParams::default(), &pod)
        .await
        .with_context(|| format!("failed to update pod {}/{}", identity.namespace, identity.name))?;

    info!(pod = %identity.name, namespace = %identity.namespace, "Recorded ping result");
    Ok(())
}
