use async_trait::async_trait;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, DeleteParams, ListParams, PostParams},
    Client, Resource, ResourceExt,
};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::{crd::WebPinger, Error, Result};

/// Object store operations the reconciler depends on.
///
/// Errors are classified into `NotFound`, `AlreadyExists`, `Conflict` and
/// `StoreUnavailable`. Replace operations carry the object's resource
/// version, so a stale write comes back as `Conflict`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PingerStore: Send + Sync {
    async fn get_pinger(&self, namespace: &str, name: &str) -> Result<WebPinger>;

    /// Replace the whole object; used for finalizer changes.
    async fn replace_pinger(&self, pinger: &WebPinger) -> Result<WebPinger>;

    /// Replace the status subresource with `pinger.status`.
    async fn replace_pinger_status(&self, pinger: &WebPinger) -> Result<()>;

    async fn get_cronjob(&self, namespace: &str, name: &str) -> Result<CronJob>;

    async fn create_cronjob(&self, cronjob: &CronJob) -> Result<()>;

    async fn delete_cronjob(&self, cronjob: &CronJob) -> Result<()>;

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>>;
}

pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespace_of<K: Resource>(object: &K) -> Result<String> {
        object
            .namespace()
            .ok_or_else(|| Error::Validation(format!("{} has no namespace", object.name_any())))
    }
}

#[async_trait]
impl PingerStore for KubeStore {
    async fn get_pinger(&self, namespace: &str, name: &str) -> Result<WebPinger> {
        let api: Api<WebPinger> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn replace_pinger(&self, pinger: &WebPinger) -> Result<WebPinger> {
        let namespace = Self::namespace_of(pinger)?;
        let api: Api<WebPinger> = Api::namespaced(self.client.clone(), &namespace);
        Ok(api
            .replace(&pinger.name_any(), &PostParams::default(), pinger)
            .await?)
    }

    async fn replace_pinger_status(&self, pinger: &WebPinger) -> Result<()> {
        let namespace = Self::namespace_of(pinger)?;
        let api: Api<WebPinger> = Api::namespaced(self.client.clone(), &namespace);
        let data = serde_json::to_vec(pinger)?;
        api.replace_status(&pinger.name_any(), &PostParams::default(), data)
            .await?;
        Ok(())
    }

    async fn get_cronjob(&self, namespace: &str, name: &str) -> Result<CronJob> {
        let api: Api<CronJob> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn create_cronjob(&self, cronjob: &CronJob) -> Result<()> {
        let namespace = Self::namespace_of(cronjob)?;
        let api: Api<CronJob> = Api::namespaced(self.client.clone(), &namespace);
        api.create(&PostParams::default(), cronjob).await?;
        Ok(())
    }

    async fn delete_cronjob(&self, cronjob: &CronJob) -> Result<()> {
        let namespace = Self::namespace_of(cronjob)?;
        let api: Api<CronJob> = Api::namespaced(self.client.clone(), &namespace);
        // Jobs and pods are garbage collected in the background.
        api.delete(&cronjob.name_any(), &DeleteParams::background())
            .await?;
        debug!(cronjob = %cronjob.name_any(), "Deleted CronJob");
        Ok(())
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pods = api
            .list(&ListParams::default().labels(label_selector))
            .await?;
        Ok(pods.items)
    }
}
