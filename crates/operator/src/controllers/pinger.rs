use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ResourceExt},
    runtime::{
        controller::{Action, Controller},
        reflector::ObjectRef,
        watcher::Config,
    },
    Client,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    crd::{WebPinger, WebPingerStatus, FINALIZER},
    kubernetes::{build_cronjob, cronjob_changed, PingerStore, WorkerSettings},
    metrics,
    probe::aggregate_status,
    protocol::{OWNER_NAMESPACE_LABEL, OWNER_NAME_LABEL, OWNER_UID_LABEL},
    Error, Result,
};

/// Observed state of the CronJob owned by a WebPinger.
enum ChildJob {
    Missing,
    Present(CronJob),
}

pub struct WebPingerController {
    store: Arc<dyn PingerStore>,
    worker: WorkerSettings,
    retry_delay: Duration,
}

impl WebPingerController {
    pub fn new(store: Arc<dyn PingerStore>, worker: WorkerSettings, retry_delay: Duration) -> Self {
        Self {
            store,
            worker,
            retry_delay,
        }
    }

    /// Watch WebPingers and their worker pods until a shutdown signal arrives.
    pub async fn run(self: Arc<Self>, client: Client, namespace: Option<String>) -> Result<()> {
        info!(namespace = ?namespace, "Starting WebPinger controller");

        let (pingers, pods): (Api<WebPinger>, Api<Pod>) = match &namespace {
            Some(ns) => (
                Api::namespaced(client.clone(), ns),
                Api::namespaced(client, ns),
            ),
            None => (Api::all(client.clone()), Api::all(client)),
        };

        Controller::new(pingers, Config::default())
            .watches(pods, Config::default().labels(OWNER_UID_LABEL), pod_to_pinger)
            .shutdown_on_signal()
            .run(Self::reconcile, Self::error_policy, self)
            .for_each(|res| async move {
                match res {
                    Ok((pinger, _action)) => debug!(pinger = %pinger.name, "Reconciled"),
                    Err(e) => warn!(error = %e, "Reconcile stream error"),
                }
            })
            .await;

        info!("WebPinger controller stopped");
        Ok(())
    }

    #[instrument(skip_all, fields(pinger = %pinger.name_any(), namespace = ?pinger.namespace()))]
    async fn reconcile(pinger: Arc<WebPinger>, ctx: Arc<Self>) -> Result<Action> {
        metrics::RECONCILIATIONS_TOTAL.inc();

        let name = pinger.name_any();
        let namespace = pinger
            .namespace()
            .ok_or_else(|| Error::Validation(format!("WebPinger {} has no namespace", name)))?;

        let pinger = match ctx.store.get_pinger(&namespace, &name).await {
            Ok(pinger) => pinger,
            Err(Error::NotFound(_)) => {
                debug!("WebPinger no longer exists");
                return Ok(Action::await_change());
            }
            Err(e) => return Err(e),
        };

        let deleting = pinger.metadata.deletion_timestamp.is_some();
        let uid = pinger
            .uid()
            .ok_or_else(|| Error::Validation(format!("WebPinger {} has no uid", name)))?;

        let child = match ctx.store.get_cronjob(&namespace, &uid).await {
            Ok(cronjob) => ChildJob::Present(cronjob),
            Err(Error::NotFound(_)) => ChildJob::Missing,
            Err(e) => return Err(e),
        };

        match (child, deleting) {
            (ChildJob::Missing, true) => {
                ctx.release_finalizer(pinger).await?;
            }
            (ChildJob::Present(current), true) => {
                ctx.store.delete_cronjob(&current).await?;
                info!(cronjob = %uid, "Deleted CronJob of deleted WebPinger");
                ctx.release_finalizer(pinger).await?;
            }
            (ChildJob::Missing, false) => {
                let pinger = ctx.ensure_finalizer(pinger).await?;
                let Some(desired) = ctx.desired_cronjob(&pinger)? else {
                    return Ok(Action::await_change());
                };
                match ctx.store.create_cronjob(&desired).await {
                    Ok(()) => info!(cronjob = %uid, "Created CronJob"),
                    Err(Error::AlreadyExists(_)) => debug!(cronjob = %uid, "CronJob already exists"),
                    Err(e) => return Err(e),
                }
            }
            (ChildJob::Present(current), false) => {
                let pinger = ctx.ensure_finalizer(pinger).await?;
                let Some(desired) = ctx.desired_cronjob(&pinger)? else {
                    return Ok(Action::await_change());
                };
                if cronjob_changed(&current, &desired) {
                    ctx.store.delete_cronjob(&current).await?;
                    ctx.store.create_cronjob(&desired).await?;
                    metrics::CRONJOB_RECREATIONS_TOTAL.inc();
                    info!(cronjob = %uid, interval = %pinger.spec.interval, "Recreated CronJob with new schedule");
                }
                ctx.update_status(pinger).await?;
            }
        }

        Ok(Action::await_change())
    }

    fn error_policy(pinger: Arc<WebPinger>, err: &Error, ctx: Arc<Self>) -> Action {
        metrics::RECONCILE_ERRORS_TOTAL.inc();
        warn!(
            pinger = %pinger.name_any(),
            error = %err,
            retry_in = ?ctx.retry_delay,
            "Reconciliation failed"
        );
        Action::requeue(ctx.retry_delay)
    }

    /// `None` when the interval cannot be turned into a schedule.
    fn desired_cronjob(&self, pinger: &WebPinger) -> Result<Option<CronJob>> {
        match build_cronjob(pinger, &self.worker) {
            Ok(cronjob) => Ok(Some(cronjob)),
            Err(e) if e.is_spec_error() => {
                warn!(interval = %pinger.spec.interval, error = %e, "Cannot schedule WebPinger");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_finalizer(&self, mut pinger: WebPinger) -> Result<WebPinger> {
        if pinger.finalizers().iter().any(|f| f == FINALIZER) {
            return Ok(pinger);
        }
        pinger.finalizers_mut().push(FINALIZER.to_string());
        let updated = self.store.replace_pinger(&pinger).await?;
        debug!("Added finalizer");
        Ok(updated)
    }

    async fn release_finalizer(&self, mut pinger: WebPinger) -> Result<()> {
        if !pinger.finalizers().iter().any(|f| f == FINALIZER) {
            return Ok(());
        }
        pinger.finalizers_mut().retain(|f| f != FINALIZER);
        self.store.replace_pinger(&pinger).await?;
        debug!("Removed finalizer");
        Ok(())
    }

    async fn update_status(&self, mut pinger: WebPinger) -> Result<()> {
        let conditions = aggregate_status(self.store.as_ref(), &pinger).await?;
        if conditions.is_empty() {
            // Pods come and go with the job history; keep the last known status.
            info!("status is empty");
            return Ok(());
        }

        let count = conditions.len();
        pinger.status = Some(WebPingerStatus { conditions });
        self.store.replace_pinger_status(&pinger).await?;
        debug!(conditions = count, "Updated status");
        Ok(())
    }
}

/// Route a worker pod event to the WebPinger that owns it.
pub fn pod_to_pinger(pod: Pod) -> Option<ObjectRef<WebPinger>> {
    let labels = pod.labels();
    let name = labels.get(OWNER_NAME_LABEL).filter(|v| !v.is_empty())?;
    let namespace = labels.get(OWNER_NAMESPACE_LABEL).filter(|v| !v.is_empty())?;
    Some(ObjectRef::new(name).within(namespace))
}
