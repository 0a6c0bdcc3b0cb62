use futures::StreamExt;
use futures::stream::BoxStream;
use k8s_openapi::api::batch::v1::{CronJob, Job};
use kube::api::{PostParams, WatchEvent, WatchParams};
use kube::{Api, Client};
use thiserror::Error;

use super::FIELD_MANAGER;

pub(crate) type JobEventStream = BoxStream<'static, Result<WatchEvent<Job>, kube::Error>>;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("{kind} '{name}' already exists: {message}")]
    AlreadyExists {
        kind: &'static str,
        name: String,
        message: String,
    },

    #[error("Kubernetes client error: {0}")]
    Kube(#[from] kube::Error),
}

impl ClusterError {
    fn classify(err: kube::Error, kind: &'static str, name: &str) -> Self {
        match err {
            kube::Error::Api(ref status) if status.code == 409 && status.reason == "AlreadyExists" => {
                ClusterError::AlreadyExists {
                    kind,
                    name: name.to_string(),
                    message: status.message.clone(),
                }
            }
            other => ClusterError::Kube(other),
        }
    }

    pub(crate) fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists { .. })
    }
}

/// The slice of the batch/v1 API the trigger routine needs.
///
/// Implemented for [`kube::Client`]; tests substitute an in-memory cluster.
pub(crate) trait BatchClient {
    async fn create_cronjob(&self, namespace: &str, cronjob: &CronJob)
    -> Result<CronJob, ClusterError>;

    async fn get_cronjob(&self, namespace: &str, name: &str) -> Result<CronJob, ClusterError>;

    async fn create_job(&self, namespace: &str, job: &Job) -> Result<Job, ClusterError>;

    /// Opens a watch scoped to the single Job `name`, starting after `resource_version`.
    async fn watch_job(
        &self,
        namespace: &str,
        name: &str,
        resource_version: &str,
    ) -> Result<JobEventStream, ClusterError>;
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    }
}

impl BatchClient for Client {
    async fn create_cronjob(
        &self,
        namespace: &str,
        cronjob: &CronJob,
    ) -> Result<CronJob, ClusterError> {
        let api: Api<CronJob> = Api::namespaced(self.clone(), namespace);
        let name = cronjob.metadata.name.as_deref().unwrap_or_default();
        api.create(&post_params(), cronjob)
            .await
            .map_err(|e| ClusterError::classify(e, "CronJob", name))
    }

    async fn get_cronjob(&self, namespace: &str, name: &str) -> Result<CronJob, ClusterError> {
        let api: Api<CronJob> = Api::namespaced(self.clone(), namespace);
        Ok(api.get(name).await?)
    }

    async fn create_job(&self, namespace: &str, job: &Job) -> Result<Job, ClusterError> {
        let api: Api<Job> = Api::namespaced(self.clone(), namespace);
        let name = job.metadata.name.as_deref().unwrap_or_default();
        api.create(&post_params(), job)
            .await
            .map_err(|e| ClusterError::classify(e, "Job", name))
    }

    async fn watch_job(
        &self,
        namespace: &str,
        name: &str,
        resource_version: &str,
    ) -> Result<JobEventStream, ClusterError> {
        let api: Api<Job> = Api::namespaced(self.clone(), namespace);
        let params = WatchParams::default().fields(&format!("metadata.name={name}"));
        let stream = api.watch(&params, resource_version).await?;
        Ok(stream.boxed())
    }
}
