pub mod error;
mod ensure_cronjob;
#[cfg(test)]
mod fake;
mod launch_job;
mod wait_until_job_finished;

use std::future::Future;
use std::sync::Arc;

use derive_debug::Dbg;
use tokio::select;
use tracing::{info, instrument, warn};
use tracing_error::SpanTrace;

use crate::config::Config;
use crate::kubernetes_objects::cluster::BatchClient;

use self::ensure_cronjob::ensure_cronjob;
use self::error::TriggerError;
use self::launch_job::launch_job;
use self::wait_until_job_finished::{JobOutcome, wait_until_job_finished};

#[derive(Dbg)]
pub(crate) struct TriggerContext<C> {
    pub(crate) config: Arc<Config>,
    #[dbg(skip)]
    pub(crate) client: C,
}

impl<C: BatchClient> TriggerContext<C> {
    pub(crate) fn new(config: Config, client: C) -> TriggerContext<C> {
        TriggerContext {
            config: Arc::new(config),
            client,
        }
    }

    /// Ensures the CronJob, launches one Job from it and waits for that Job.
    ///
    /// Fails fast; nothing created along the way is cleaned up.
    #[instrument(
        "trigger_routine",
        skip(self, cancel),
        fields(
            kubernetes_namespace = %self.config.namespace,
            cronjob_name = %self.config.cronjob.name
        )
    )]
    pub(crate) async fn run(&self, cancel: impl Future<Output = ()>) -> Result<(), TriggerError> {
        let namespace = &self.config.namespace;
        let cronjob_name = &self.config.cronjob.name;
        info!("Triggering CronJob '{}'...", cronjob_name);
        tokio::pin!(cancel);

        let launched = async {
            let desired = self.config.cronjob.to_cronjob(namespace);
            let cronjob = ensure_cronjob(&self.client, namespace, cronjob_name, &desired).await?;
            launch_job(&self.client, &cronjob).await
        };
        let job = select! {
            _ = &mut cancel => {
                warn!("Trigger of CronJob '{}' was cancelled before its job was created.", cronjob_name);
                return Err(TriggerError::Timeout(
                    format!("CronJob '{cronjob_name}'"),
                    SpanTrace::capture(),
                ));
            }
            job = launched => job?,
        };
        let job_name = job.metadata.name.clone().unwrap_or_default();

        let outcome = wait_until_job_finished(&self.client, &job, cancel.as_mut())
            .await
            .map_err(|e| TriggerError::WaitJobFinished(job_name.clone(), e))?;

        match outcome {
            JobOutcome::Succeeded => {
                info!("Job '{}' for CronJob '{}' succeeded.", job_name, cronjob_name);
                Ok(())
            }
            JobOutcome::Failed(message) => Err(TriggerError::JobFailed(
                job_name,
                message,
                SpanTrace::capture(),
            )),
            JobOutcome::TimedOut => Err(TriggerError::Timeout(
                format!("job '{job_name}'"),
                SpanTrace::capture(),
            )),
        }
    }
}
