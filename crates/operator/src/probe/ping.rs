use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use tracing::{info, warn};

use crate::crd::{Condition, ConditionType, PingReason};
use crate::{Error, Result};

/// Where a worker pod lives, as exposed through its downward-API volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodIdentity {
    pub name: String,
    pub namespace: String,
}

impl PodIdentity {
    pub fn from_files(name_path: &Path, namespace_path: &Path) -> Result<Self> {
        let name = std::fs::read_to_string(name_path)?.trim().to_string();
        let namespace = std::fs::read_to_string(namespace_path)?.trim().to_string();
        if name.is_empty() || namespace.is_empty() {
            return Err(Error::Config(format!(
                "empty pod identity read from {} and {}",
                name_path.display(),
                namespace_path.display()
            )));
        }
        Ok(Self { name, namespace })
    }
}

/// Join the worker's base URL and the WebPinger endpoint.
pub fn ping_url(base_url: &str, endpoint: &str) -> Result<String> {
    let joined = format!("{}{}", base_url, endpoint);
    let url = url::Url::parse(&joined)
        .map_err(|e| Error::Config(format!("invalid ping URL '{}': {}", joined, e)))?;
    Ok(url.to_string())
}

/// Certificate checks are skipped: the probe reports reachability, not trust.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Probe(e.to_string()))
}

/// Send a single GET and describe the outcome.
///
/// No response at all is `ServiceOffline`. Any response is `ServiceOnline`,
/// and only a 2xx whose body could be read counts as a success.
pub async fn ping(client: &reqwest::Client, url: &str) -> Condition {
    let mut condition = Condition {
        condition_type: Some(ConditionType::ServiceOffline),
        status: false,
        reason: Some(PingReason::PingFailed),
        message: String::new(),
        ping_time: Some(Time(Utc::now())),
    };

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %url, error = %e, "Ping failed");
            return condition;
        }
    };

    condition.condition_type = Some(ConditionType::ServiceOnline);
    let status = response.status();
    info!(url = %url, status = %status, headers = ?response.headers(), "Received response");

    match response.text().await {
        Ok(body) => {
            if status.is_success() {
                condition.status = true;
                condition.reason = Some(PingReason::PingSucceeded);
            }
            condition.message = body;
        }
        Err(e) => warn!(url = %url, error = %e, "Could not read response body"),
    }

    condition
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use tokio::net::TcpListener;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client() -> reqwest::Client {
        build_http_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_ping_success() {
        let base = serve(Router::new().route(
            "/prices/BTC-USD/buy",
            get(|| async { r#"{"data":{"amount":"47000.00"}}"# }),
        ))
        .await;

        let url = ping_url(&base, "/prices/BTC-USD/buy").unwrap();
        let condition = ping(&client(), &url).await;

        assert_eq!(condition.condition_type, Some(ConditionType::ServiceOnline));
        assert!(condition.status);
        assert_eq!(condition.reason, Some(PingReason::PingSucceeded));
        assert_eq!(condition.message, r#"{"data":{"amount":"47000.00"}}"#);
        assert!(condition.ping_time.is_some());
    }

    #[tokio::test]
    async fn test_ping_server_error_is_online_but_failed() {
        let base = serve(Router::new().route(
            "/health",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        ))
        .await;

        let condition = ping(&client(), &format!("{}/health", base)).await;

        assert_eq!(condition.condition_type, Some(ConditionType::ServiceOnline));
        assert!(!condition.status);
        assert_eq!(condition.reason, Some(PingReason::PingFailed));
        assert_eq!(condition.message, "maintenance");
    }

    #[tokio::test]
    async fn test_ping_unreachable_is_offline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let condition = ping(&client(), &format!("http://{}/", addr)).await;

        assert_eq!(condition.condition_type, Some(ConditionType::ServiceOffline));
        assert!(!condition.status);
        assert_eq!(condition.reason, Some(PingReason::PingFailed));
        assert_eq!(condition.message, "");
    }

    #[test]
    fn test_ping_url() {
        assert_eq!(
            ping_url("https://api.coinbase.com/v2", "/prices/BTC-USD/buy").unwrap(),
            "https://api.coinbase.com/v2/prices/BTC-USD/buy"
        );
        assert!(ping_url("", "/prices").is_err());
    }

    #[test]
    fn test_pod_identity_from_files() {
        let dir = std::env::temp_dir().join(format!("webping-identity-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let name_path = dir.join("name");
        let namespace_path = dir.join("namespace");
        std::fs::write(&name_path, "abc-28394-xyz\n").unwrap();
        std::fs::write(&namespace_path, "prices").unwrap();

        let identity = PodIdentity::from_files(&name_path, &namespace_path).unwrap();
        assert_eq!(identity.name, "abc-28394-xyz");
        assert_eq!(identity.namespace, "prices");

        std::fs::write(&namespace_path, "").unwrap();
        assert!(PodIdentity::from_files(&name_path, &namespace_path).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(
            PodIdentity::from_files(&name_path, &namespace_path),
            Err(Error::Io(_))
        ));
    }
}
