use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::debug;

use crate::crd::{Condition, WebPinger};
use crate::kubernetes::PingerStore;
use crate::protocol::owner_selector;
use crate::{Error, Result};

use super::codec::decode_pod;

/// One condition per pod, in listing order. No sorting, deduplication or
/// phase filtering: a pod that is still running contributes whatever it
/// exposes so far.
pub fn conditions_from_pods(pods: &[Pod]) -> Vec<Condition> {
    pods.iter().map(decode_pod).collect()
}

/// Collect the conditions reported by every worker pod of `pinger`.
pub async fn aggregate_status(store: &dyn PingerStore, pinger: &WebPinger) -> Result<Vec<Condition>> {
    let namespace = pinger
        .namespace()
        .ok_or_else(|| Error::Validation(format!("WebPinger {} has no namespace", pinger.name_any())))?;
    let uid = pinger
        .uid()
        .ok_or_else(|| Error::Validation(format!("WebPinger {} has no uid", pinger.name_any())))?;

    let pods = store.list_pods(&namespace, &owner_selector(&uid)).await?;
    debug!(pods = pods.len(), "Collected worker pods");
    Ok(conditions_from_pods(&pods))
}
