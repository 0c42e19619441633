use chrono::Duration;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{schedule::parse_duration, Error, Result};

/// Placed on every live WebPinger so its CronJob is removed before the
/// WebPinger itself goes away.
pub const FINALIZER: &str = "webpinger.dev/finalizer";

#[derive(CustomResource, Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[kube(
    group = "webpinger.dev",
    version = "v1",
    kind = "WebPinger",
    namespaced,
    status = "WebPingerStatus",
    shortname = "wping",
    printcolumn = r#"{"name":"Endpoint", "type":"string", "jsonPath":".spec.endpoint"}"#,
    printcolumn = r#"{"name":"Interval", "type":"string", "jsonPath":".spec.interval"}"#
)]
pub struct WebPingerSpec {
    /// Path appended to the worker's base URL
    pub endpoint: String,

    /// How often to ping, e.g. "5m" or "2h". Must be at least one minute and
    /// less than 24 hours.
    pub interval: String,
}

impl WebPingerSpec {
    /// Range check applied by the admission webhook.
    pub fn validate(&self) -> Result<()> {
        let duration = parse_duration(&self.interval).map_err(|_| {
            Error::Validation(
                "Non parsable interval. Must consist of decimal numbers with unit suffix ns, us, ms, s, m or h"
                    .to_string(),
            )
        })?;
        if duration < Duration::minutes(1) || duration >= Duration::hours(24) {
            return Err(Error::Validation(
                "Interval must be at least 1 minute and less than 24 hours".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
pub struct WebPingerStatus {
    /// One entry per worker pod currently reporting a result
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// A single ping outcome as reported by one worker pod.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub condition_type: Option<ConditionType>,

    /// Whether the ping succeeded
    #[serde(default)]
    pub status: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<PingReason>,

    /// Response body returned by the endpoint
    #[serde(default)]
    pub message: String,

    /// When the ping was sent. Unset means the zero timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping_time: Option<Time>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum ConditionType {
    ServiceOnline,
    ServiceOffline,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::ServiceOnline => "ServiceOnline",
            ConditionType::ServiceOffline => "ServiceOffline",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "ServiceOnline" => Some(ConditionType::ServiceOnline),
            "ServiceOffline" => Some(ConditionType::ServiceOffline),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub enum PingReason {
    PingSucceeded,
    PingFailed,
}

impl PingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PingReason::PingSucceeded => "PingSucceeded",
            PingReason::PingFailed => "PingFailed",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "PingSucceeded" => Some(PingReason::PingSucceeded),
            "PingFailed" => Some(PingReason::PingFailed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn spec(interval: &str) -> WebPingerSpec {
        WebPingerSpec {
            endpoint: "/prices/BTC-USD/buy".to_string(),
            interval: interval.to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_range() {
        for interval in ["1m", "60s", "90m", "23h", "23h59m59s"] {
            assert!(spec(interval).validate().is_ok(), "{} should be valid", interval);
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        for interval in ["59s", "0", "-5m", "24h", "48h"] {
            let err = spec(interval).validate().unwrap_err();
            assert!(err.to_string().contains("at least 1 minute"), "{}: {}", interval, err);
        }
    }

    #[test]
    fn test_validate_rejects_unparsable() {
        let err = spec("every hour").validate().unwrap_err();
        assert!(err.to_string().contains("Non parsable interval"));
    }

    #[test]
    fn test_label_values() {
        assert_eq!(ConditionType::ServiceOnline.as_str(), "ServiceOnline");
        assert_eq!(
            ConditionType::from_label("ServiceOffline"),
            Some(ConditionType::ServiceOffline)
        );
        assert_eq!(ConditionType::from_label(""), None);
        assert_eq!(PingReason::from_label("PingFailed"), Some(PingReason::PingFailed));
        assert_eq!(PingReason::from_label("pingfailed"), None);
    }

    #[test]
    fn test_condition_serialization() {
        let condition = Condition {
            condition_type: Some(ConditionType::ServiceOnline),
            status: true,
            reason: Some(PingReason::PingSucceeded),
            message: "{}".to_string(),
            ping_time: Some(Time(Utc.with_ymd_and_hms(2021, 9, 1, 12, 0, 0).unwrap())),
        };
        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "ServiceOnline",
                "status": true,
                "reason": "PingSucceeded",
                "message": "{}",
                "pingTime": "2021-09-01T12:00:00Z",
            })
        );
    }

    #[test]
    fn test_default_condition_serialization() {
        let value = serde_json::to_value(Condition::default()).unwrap();
        assert_eq!(value, json!({ "status": false, "message": "" }));

        let parsed: Condition = serde_json::from_value(json!({})).unwrap();
        assert_eq!(parsed, Condition::default());
    }
}
