use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::{
    Container, DownwardAPIVolumeFile, DownwardAPIVolumeSource, EnvVar, ObjectFieldSelector,
    PodSpec, PodTemplateSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{Resource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::crd::WebPinger;
use crate::protocol::{
    owner_labels, BASE_URL_ENV, DEFAULT_NAMESPACE_PATH, DEFAULT_POD_NAME_PATH,
    NAMESPACE_FILEPATH_ENV, PODINFO_MOUNT_PATH, PODINFO_VOLUME, POD_NAME_FILEPATH_ENV,
};
use crate::schedule::derive_schedule;
use crate::{Error, Result};

const WORKER_CONTAINER: &str = "pinger";

/// How worker pods are run. Shared by every WebPinger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSettings {
    pub image: String,
    pub command: String,
    pub base_url: String,
    pub service_account: String,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            image: "webpinger/webping:latest".to_string(),
            command: "/webping".to_string(),
            base_url: "https://api.coinbase.com/v2".to_string(),
            service_account: "web-pinger-sa".to_string(),
        }
    }
}

/// Build the CronJob that should exist for `pinger`.
///
/// The CronJob is named after the WebPinger's uid, so it can be looked up
/// without an index, and is owned by the WebPinger for cascading deletion.
pub fn build_cronjob(pinger: &WebPinger, worker: &WorkerSettings) -> Result<CronJob> {
    let name = pinger.name_any();
    let namespace = pinger
        .namespace()
        .ok_or_else(|| Error::Validation(format!("WebPinger {} has no namespace", name)))?;
    let uid = pinger
        .uid()
        .ok_or_else(|| Error::Validation(format!("WebPinger {} has no uid", name)))?;
    let owner = pinger
        .controller_owner_ref(&())
        .ok_or_else(|| Error::Validation(format!("WebPinger {} has no owner identity", name)))?;

    let schedule = derive_schedule(&pinger.spec.interval)?;

    Ok(CronJob {
        metadata: ObjectMeta {
            name: Some(uid.clone()),
            namespace: Some(namespace.clone()),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(CronJobSpec {
            schedule,
            concurrency_policy: Some("Forbid".to_string()),
            job_template: JobTemplateSpec {
                metadata: None,
                spec: Some(JobSpec {
                    template: PodTemplateSpec {
                        metadata: Some(ObjectMeta {
                            labels: Some(owner_labels(&uid, &name, &namespace)),
                            ..Default::default()
                        }),
                        spec: Some(worker_pod_spec(pinger, worker)),
                    },
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}

fn worker_pod_spec(pinger: &WebPinger, worker: &WorkerSettings) -> PodSpec {
    let env = |name: &str, value: &str| EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    };
    let field = |path: &str, field_path: &str| DownwardAPIVolumeFile {
        path: path.to_string(),
        field_ref: Some(ObjectFieldSelector {
            field_path: field_path.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    };

    PodSpec {
        service_account_name: Some(worker.service_account.clone()),
        restart_policy: Some("Never".to_string()),
        containers: vec![Container {
            name: WORKER_CONTAINER.to_string(),
            image: Some(worker.image.clone()),
            command: Some(vec![worker.command.clone()]),
            args: Some(vec![pinger.spec.endpoint.clone()]),
            env: Some(vec![
                env(BASE_URL_ENV, &worker.base_url),
                env(POD_NAME_FILEPATH_ENV, DEFAULT_POD_NAME_PATH),
                env(NAMESPACE_FILEPATH_ENV, DEFAULT_NAMESPACE_PATH),
            ]),
            volume_mounts: Some(vec![VolumeMount {
                name: PODINFO_VOLUME.to_string(),
                mount_path: PODINFO_MOUNT_PATH.to_string(),
                read_only: Some(true),
                ..Default::default()
            }]),
            ..Default::default()
        }],
        volumes: Some(vec![Volume {
            name: PODINFO_VOLUME.to_string(),
            downward_api: Some(DownwardAPIVolumeSource {
                items: Some(vec![
                    field("namespace", "metadata.namespace"),
                    field("name", "metadata.name"),
                ]),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

fn schedule_of(cronjob: &CronJob) -> Option<&str> {
    cronjob.spec.as_ref().map(|spec| spec.schedule.as_str())
}

/// Only the schedule decides whether a live CronJob must be replaced.
pub fn cronjob_changed(current: &CronJob, desired: &CronJob) -> bool {
    schedule_of(current) != schedule_of(desired)
}
