use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::kubernetes::WorkerSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub controller: ControllerConfig,
    pub worker: WorkerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Namespace to watch; all namespaces when unset
    pub namespace: Option<String>,
    /// Fixed delay before a failed reconciliation is retried
    pub retry_seconds: u64,
}

impl ControllerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_seconds)
    }
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let retry_seconds = match lookup("RECONCILE_RETRY_SECONDS") {
            Some(raw) => raw.parse().map_err(|_| {
                crate::Error::Config(format!(
                    "RECONCILE_RETRY_SECONDS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?,
            None => defaults.controller.retry_seconds,
        };

        let config = Config {
            server: ServerConfig {
                addr: lookup("SERVER_ADDR").unwrap_or(defaults.server.addr),
            },
            controller: ControllerConfig {
                namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty()),
                retry_seconds,
            },
            worker: WorkerSettings {
                image: lookup("WORKER_IMAGE").unwrap_or(defaults.worker.image),
                command: lookup("WORKER_COMMAND").unwrap_or(defaults.worker.command),
                base_url: lookup("WORKER_BASE_URL").unwrap_or(defaults.worker.base_url),
                service_account: lookup("WORKER_SERVICE_ACCOUNT")
                    .unwrap_or(defaults.worker.service_account),
            },
        };

        if config.controller.retry_seconds == 0 {
            return Err(crate::Error::Config(
                "RECONCILE_RETRY_SECONDS must be greater than zero".to_string(),
            ));
        }
        if config.worker.image.is_empty() {
            return Err(crate::Error::Config("WORKER_IMAGE must not be empty".to_string()));
        }
        if url::Url::parse(&config.worker.base_url).is_err() {
            return Err(crate::Error::Config(format!(
                "WORKER_BASE_URL is not a valid URL: '{}'",
                config.worker.base_url
            )));
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                addr: "0.0.0.0:8080".to_string(),
            },
            controller: ControllerConfig {
                namespace: None,
                retry_seconds: 10,
            },
            worker: WorkerSettings::default(),
        }
    }
}
