use std::collections::BTreeMap;

use chrono::SecondsFormat;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::ResourceExt;
use tracing::warn;

use crate::crd::{Condition, ConditionType, PingReason};
use crate::protocol::{
    MESSAGE_ANNOTATION, PING_TIME_ANNOTATION, REASON_LABEL, STATUS_LABEL, TYPE_LABEL,
};

/// Read the probe result a worker left on its pod.
///
/// Never fails: missing metadata leaves the matching fields at their
/// defaults and an undecodable `ping-time` is logged and treated as the zero
/// timestamp.
pub fn decode_pod(pod: &Pod) -> Condition {
    let mut condition = Condition::default();

    if let Some(labels) = pod.metadata.labels.as_ref() {
        condition.condition_type = labels
            .get(TYPE_LABEL)
            .and_then(|value| ConditionType::from_label(value));
        condition.status = labels.get(STATUS_LABEL).map(|value| value == "true").unwrap_or(false);
        condition.reason = labels
            .get(REASON_LABEL)
            .and_then(|value| PingReason::from_label(value));
    }

    if let Some(annotations) = pod.metadata.annotations.as_ref() {
        condition.message = annotations
            .get(MESSAGE_ANNOTATION)
            .cloned()
            .unwrap_or_default();
        if let Some(raw) = annotations.get(PING_TIME_ANNOTATION) {
            condition.ping_time = decode_ping_time(&pod.name_any(), raw);
        }
    }

    condition
}

fn decode_ping_time(pod_name: &str, raw: &str) -> Option<Time> {
    match serde_json::from_str::<Option<Time>>(raw) {
        Ok(time) => time,
        Err(e) => {
            warn!(
                pod = %pod_name,
                ping_time = %raw,
                error = %e,
                "Could not decode ping-time annotation"
            );
            None
        }
    }
}

/// JSON encoding of a ping time: a quoted RFC3339 UTC timestamp with
/// microseconds, or `null` for the zero timestamp.
pub fn encode_ping_time(time: Option<&Time>) -> String {
    match time {
        Some(Time(instant)) => {
            serde_json::Value::String(instant.to_rfc3339_opts(SecondsFormat::Micros, true))
                .to_string()
        }
        None => "null".to_string(),
    }
}

/// Write a probe result onto pod metadata, keeping unrelated labels and
/// annotations intact.
pub fn encode_condition(condition: &Condition, metadata: &mut ObjectMeta) {
    let labels = metadata.labels.get_or_insert_with(BTreeMap::new);
    labels.insert(
        TYPE_LABEL.to_string(),
        condition
            .condition_type
            .map(|t| t.as_str())
            .unwrap_or_default()
            .to_string(),
    );
    labels.insert(STATUS_LABEL.to_string(), condition.status.to_string());
    labels.insert(
        REASON_LABEL.to_string(),
        condition
            .reason
            .map(|r| r.as_str())
            .unwrap_or_default()
            .to_string(),
    );

    let annotations = metadata.annotations.get_or_insert_with(BTreeMap::new);
    annotations.insert(MESSAGE_ANNOTATION.to_string(), condition.message.clone());
    annotations.insert(
        PING_TIME_ANNOTATION.to_string(),
        encode_ping_time(condition.ping_time.as_ref()),
    );
}
