//! Pod metadata vocabulary shared by the `webping` worker, which writes probe
//! results onto its own pod, and the controller, which reads them back.

use std::collections::BTreeMap;

/// Label carrying `ServiceOnline` or `ServiceOffline`.
pub const TYPE_LABEL: &str = "type";
/// Label carrying `"true"` or `"false"`.
pub const STATUS_LABEL: &str = "status";
/// Label carrying `PingSucceeded` or `PingFailed`.
pub const REASON_LABEL: &str = "reason";
/// Annotation carrying the raw response body.
pub const MESSAGE_ANNOTATION: &str = "message";
/// Annotation carrying a JSON-encoded RFC3339 timestamp.
pub const PING_TIME_ANNOTATION: &str = "ping-time";

// Identity labels. Used for event routing and pod lookup, never for ownership.
pub const OWNER_UID_LABEL: &str = "owner-uid";
pub const OWNER_NAME_LABEL: &str = "owner-name";
pub const OWNER_NAMESPACE_LABEL: &str = "owner-namespace";

// Worker environment.
pub const BASE_URL_ENV: &str = "BASE_URL";
pub const POD_NAME_FILEPATH_ENV: &str = "POD_NAME_FILEPATH";
pub const NAMESPACE_FILEPATH_ENV: &str = "NAMESPACE_FILEPATH";

pub const PODINFO_VOLUME: &str = "podinfo";
pub const PODINFO_MOUNT_PATH: &str = "/etc/podinfo";
pub const DEFAULT_POD_NAME_PATH: &str = "/etc/podinfo/name";
pub const DEFAULT_NAMESPACE_PATH: &str = "/etc/podinfo/namespace";

/// Identity labels stamped on every worker pod of a WebPinger.
pub fn owner_labels(uid: &str, name: &str, namespace: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(OWNER_UID_LABEL.to_string(), uid.to_string());
    labels.insert(OWNER_NAME_LABEL.to_string(), name.to_string());
    labels.insert(OWNER_NAMESPACE_LABEL.to_string(), namespace.to_string());
    labels
}

/// Label selector matching the worker pods of the WebPinger with `uid`.
pub fn owner_selector(uid: &str) -> String {
    format!("{}={}", OWNER_UID_LABEL, uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_labels() {
        let labels = owner_labels("1234", "btc", "prices");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels["owner-uid"], "1234");
        assert_eq!(labels["owner-name"], "btc");
        assert_eq!(labels["owner-namespace"], "prices");
    }

    #[test]
    fn test_owner_selector() {
        assert_eq!(owner_selector("1234"), "owner-uid=1234");
    }
}
