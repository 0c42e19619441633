use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::{Error, Result};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref RECONCILIATIONS_TOTAL: IntCounter = IntCounter::new(
        "webpinger_reconciliations_total",
        "Total number of WebPinger reconciliation passes."
    )
    .unwrap();
    pub static ref RECONCILE_ERRORS_TOTAL: IntCounter = IntCounter::new(
        "webpinger_reconcile_errors_total",
        "Total number of WebPinger reconciliation passes that ended in an error."
    )
    .unwrap();
    pub static ref CRONJOB_RECREATIONS_TOTAL: IntCounter = IntCounter::new(
        "webpinger_cronjob_recreations_total",
        "Total number of CronJobs deleted and recreated after a schedule change."
    )
    .unwrap();
}

pub fn register_metrics() -> Result<()> {
    for counter in [
        &*RECONCILIATIONS_TOTAL,
        &*RECONCILE_ERRORS_TOTAL,
        &*CRONJOB_RECREATIONS_TOTAL,
    ] {
        match REGISTRY.register(Box::new(counter.clone())) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(Error::Config(format!("failed to register metric: {}", e))),
        }
    }
    Ok(())
}

/// Text exposition of every registered metric.
pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| Error::Config(format!("failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer).map_err(|e| Error::Config(format!("metrics are not UTF-8: {}", e)))
}
