use std::collections::BTreeMap;
use std::future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::StreamExt;
use futures::channel::mpsc;
use k8s_openapi::api::batch::v1::{CronJob, Job};
use kube::api::WatchEvent;
use uuid::Uuid;

use crate::kubernetes_objects::cluster::{BatchClient, ClusterError, JobEventStream};
use crate::kubernetes_objects::cronjob::{ContainerTemplate, CronJobTemplate};

pub(crate) type JobEventSender = mpsc::UnboundedSender<Result<WatchEvent<Job>, kube::Error>>;
type JobEventReceiver = mpsc::UnboundedReceiver<Result<WatchEvent<Job>, kube::Error>>;

pub(crate) fn serde_failure() -> kube::Error {
    kube::Error::SerdeError(serde_json::from_str::<Job>("{").unwrap_err())
}

pub(crate) fn api_failure() -> ClusterError {
    ClusterError::Kube(serde_failure())
}

/// In-memory batch/v1 API with just enough behaviour for the trigger routine.
#[derive(Default)]
pub(crate) struct FakeCluster {
    cronjobs: Mutex<BTreeMap<(String, String), CronJob>>,
    jobs: Mutex<Vec<Job>>,
    job_watch: Mutex<Option<JobEventReceiver>>,
    watch_requests: Mutex<Vec<(String, String, String)>>,
    cronjob_create_failure: Mutex<Option<ClusterError>>,
    job_create_failure: Mutex<Option<ClusterError>>,
    cronjob_create_calls: AtomicUsize,
    cronjob_get_calls: AtomicUsize,
    resource_version: AtomicUsize,
}

impl FakeCluster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The next `watch_job` call streams whatever is sent on the paired sender.
    pub(crate) fn with_job_watch(self, events: JobEventReceiver) -> Self {
        *self.job_watch.lock().unwrap() = Some(events);
        self
    }

    pub(crate) fn hello_world() -> CronJobTemplate {
        CronJobTemplate {
            name: "hello-world".to_string(),
            schedule: "0 */10 * * *".to_string(),
            successful_jobs_history_limit: 3,
            suspend: false,
            container: ContainerTemplate {
                name: "hello-world".to_string(),
                image: "alpine".to_string(),
                image_pull_policy: "IfNotPresent".to_string(),
                command: vec![
                    "/bin/sh".to_string(),
                    "-c".to_string(),
                    r#"echo "Hello World""#.to_string(),
                ],
            },
            restart_policy: "Never".to_string(),
        }
    }

    pub(crate) fn fail_next_cronjob_create(&self, err: ClusterError) {
        *self.cronjob_create_failure.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_next_job_create(&self, err: ClusterError) {
        *self.job_create_failure.lock().unwrap() = Some(err);
    }

    pub(crate) fn cronjob_create_calls(&self) -> usize {
        self.cronjob_create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn cronjob_get_calls(&self) -> usize {
        self.cronjob_get_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn stored_cronjobs(&self) -> usize {
        self.cronjobs.lock().unwrap().len()
    }

    pub(crate) fn created_jobs(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().clone()
    }

    pub(crate) fn watch_requests(&self) -> Vec<(String, String, String)> {
        self.watch_requests.lock().unwrap().clone()
    }

    fn next_resource_version(&self) -> String {
        (self.resource_version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

impl BatchClient for FakeCluster {
    async fn create_cronjob(
        &self,
        namespace: &str,
        cronjob: &CronJob,
    ) -> Result<CronJob, ClusterError> {
        self.cronjob_create_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.cronjob_create_failure.lock().unwrap().take() {
            return Err(err);
        }

        let name = cronjob.metadata.name.clone().unwrap_or_default();
        let mut cronjobs = self.cronjobs.lock().unwrap();
        let key = (namespace.to_string(), name.clone());
        if cronjobs.contains_key(&key) {
            return Err(ClusterError::AlreadyExists {
                kind: "CronJob",
                message: format!("cronjobs.batch \"{name}\" already exists"),
                name,
            });
        }

        let mut stored = cronjob.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        stored.metadata.uid = Some(Uuid::new_v4().to_string());
        stored.metadata.resource_version = Some(self.next_resource_version());
        cronjobs.insert(key, stored.clone());
        Ok(stored)
    }

    async fn get_cronjob(&self, namespace: &str, name: &str) -> Result<CronJob, ClusterError> {
        self.cronjob_get_calls.fetch_add(1, Ordering::SeqCst);
        self.cronjobs
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(api_failure)
    }

    async fn create_job(&self, namespace: &str, job: &Job) -> Result<Job, ClusterError> {
        if let Some(err) = self.job_create_failure.lock().unwrap().take() {
            return Err(err);
        }

        let mut stored = job.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        stored.metadata.uid = Some(Uuid::new_v4().to_string());
        stored.metadata.resource_version = Some(self.next_resource_version());
        self.jobs.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn watch_job(
        &self,
        namespace: &str,
        name: &str,
        resource_version: &str,
    ) -> Result<JobEventStream, ClusterError> {
        self.watch_requests.lock().unwrap().push((
            namespace.to_string(),
            name.to_string(),
            resource_version.to_string(),
        ));
        self.job_watch
            .lock()
            .unwrap()
            .take()
            .map(StreamExt::boxed)
            .ok_or_else(api_failure)
    }
}

/// A cluster whose API server never answers.
pub(crate) struct HangingCluster;

impl BatchClient for HangingCluster {
    async fn create_cronjob(&self, _: &str, _: &CronJob) -> Result<CronJob, ClusterError> {
        future::pending().await
    }

    async fn get_cronjob(&self, _: &str, _: &str) -> Result<CronJob, ClusterError> {
        future::pending().await
    }

    async fn create_job(&self, _: &str, _: &Job) -> Result<Job, ClusterError> {
        future::pending().await
    }

    async fn watch_job(&self, _: &str, _: &str, _: &str) -> Result<JobEventStream, ClusterError> {
        future::pending().await
    }
}
