pub mod config;
pub mod controllers;
pub mod crd;
pub mod kubernetes;
pub mod metrics;
pub mod probe;
pub mod protocol;
pub mod schedule;
pub mod server;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invalid duration \"{0}\"")]
    InvalidDuration(String),
    #[error("Bad duration, must be at least a minute, but got {0} minute")]
    ScheduleTooFrequent(i64),
    #[error("Bad duration, must be less than 24 hours, but got {0} hours")]
    ScheduleTooInfrequent(i64),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Probe error: {0}")]
    Probe(String),
}

impl Error {
    /// Schedule derivation and validation failures only go away when the
    /// resource spec changes, so retrying them is pointless.
    pub fn is_spec_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidDuration(_)
                | Error::ScheduleTooFrequent(_)
                | Error::ScheduleTooInfrequent(_)
                | Error::Validation(_)
        )
    }
}

impl From<kube::Error> for Error {
    fn from(err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(resp) if resp.code == 404 => Error::NotFound(resp.message.clone()),
            kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
                Error::AlreadyExists(resp.message.clone())
            }
            kube::Error::Api(resp) if resp.code == 409 => Error::Conflict(resp.message.clone()),
            _ => Error::StoreUnavailable(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
