use std::future::Future;
use std::time::Duration;

use derive_debug::Dbg;
use futures::StreamExt;
use k8s_openapi::api::batch::v1::Job;
use kube::api::WatchEvent;
use tokio::select;
use tracing::{Instrument, error, info, instrument, trace, trace_span, warn};

use crate::error::{SpannedErr, SpannedExt};
use crate::kubernetes_objects::cluster::{BatchClient, JobEventStream};

use super::error::WaitJobFinishedError;

/// Upper bound on a single wait, independent of any caller deadline.
pub(crate) const JOB_COMPLETION_CEILING: Duration = Duration::from_secs(3 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JobOutcome {
    Succeeded,
    /// Carries the message of the `Failed` condition
    Failed(String),
    TimedOut,
}

/// A live watch on one Job. Dropping it closes the stream on the API server.
#[derive(Dbg)]
struct JobWatch {
    job_name: String,
    #[dbg(skip)]
    events: JobEventStream,
}

impl JobWatch {
    async fn subscribe<C: BatchClient>(
        client: &C,
        namespace: &str,
        job_name: &str,
        resource_version: &str,
    ) -> Result<JobWatch, SpannedErr<WaitJobFinishedError>> {
        let events = async {
            client
                .watch_job(namespace, job_name, resource_version)
                .await
                .map_err(WaitJobFinishedError::Subscribe)
                .with_span_trace()
        }
        .instrument(trace_span!("watch_job"))
        .await?;
        trace!("Subscribed to events of job '{}'.", job_name);
        Ok(JobWatch {
            job_name: job_name.to_string(),
            events,
        })
    }

    async fn next(&mut self) -> Option<Result<WatchEvent<Job>, kube::Error>> {
        self.events.next().await
    }
}

impl Drop for JobWatch {
    fn drop(&mut self) {
        trace!("Released watch on job '{}'.", self.job_name);
    }
}

/// Scans the conditions in order; the first `Complete` or `Failed` one decides,
/// whatever its status.
pub(crate) fn terminal_outcome(job: &Job) -> Option<JobOutcome> {
    let conditions = job.status.as_ref()?.conditions.as_ref()?;
    conditions
        .iter()
        .find_map(|condition| match condition.type_.as_str() {
            "Complete" => Some(JobOutcome::Succeeded),
            "Failed" => Some(JobOutcome::Failed(
                condition.message.clone().unwrap_or_default(),
            )),
            _ => None,
        })
}

/// Waits until `job` reports `Complete` or `Failed`, `cancel` resolves, or
/// [`JOB_COMPLETION_CEILING`] elapses, whichever happens first.
#[instrument(
    "wait_until_job_finished",
    skip(client, job, cancel),
    fields(job_name = job.metadata.name.as_deref().unwrap_or("<unknown>"))
)]
pub(super) async fn wait_until_job_finished<C: BatchClient>(
    client: &C,
    job: &Job,
    cancel: impl Future<Output = ()>,
) -> Result<JobOutcome, SpannedErr<WaitJobFinishedError>> {
    let ceiling = tokio::time::sleep(JOB_COMPLETION_CEILING);
    tokio::pin!(ceiling);
    tokio::pin!(cancel);

    let namespace = job.metadata.namespace.as_deref().unwrap_or("default");
    let job_name = job.metadata.name.as_deref().unwrap_or_default();
    let resource_version = job.metadata.resource_version.as_deref().unwrap_or("0");

    info!(
        "Waiting up to {} seconds for job '{}' to finish...",
        JOB_COMPLETION_CEILING.as_secs(),
        job_name
    );

    let subscribe = JobWatch::subscribe(client, namespace, job_name, resource_version);
    let mut watch = select! {
        _ = &mut cancel => {
            warn!("Wait for job '{}' was cancelled before the watch was established.", job_name);
            return Ok(JobOutcome::TimedOut);
        }
        _ = &mut ceiling => {
            error!(
                "Waited more than {} seconds for the watch on job '{}' to be established.",
                JOB_COMPLETION_CEILING.as_secs(),
                job_name
            );
            return Ok(JobOutcome::TimedOut);
        }
        watch = subscribe => watch?,
    };

    loop {
        select! {
            _ = &mut cancel => {
                warn!("Wait for job '{}' was cancelled.", job_name);
                break Ok(JobOutcome::TimedOut);
            }
            _ = &mut ceiling => {
                error!(
                    "Waited more than {} seconds for job '{}' to finish.",
                    JOB_COMPLETION_CEILING.as_secs(),
                    job_name
                );
                break Ok(JobOutcome::TimedOut);
            }
            event = watch.next() => {
                let updated = match event {
                    Some(Ok(WatchEvent::Added(job)))
                    | Some(Ok(WatchEvent::Modified(job)))
                    | Some(Ok(WatchEvent::Deleted(job))) => job,
                    Some(Ok(WatchEvent::Bookmark(_))) => continue,
                    Some(Ok(WatchEvent::Error(status))) => {
                        break Err(WaitJobFinishedError::UnexpectedObject(format!(
                            "Status ({})",
                            status.message
                        )))
                        .with_span_trace();
                    }
                    Some(Err(kube::Error::SerdeError(e))) => {
                        break Err(WaitJobFinishedError::UnexpectedObject(format!(
                            "undecodable ({e})"
                        )))
                        .with_span_trace();
                    }
                    Some(Err(e)) => {
                        break Err(WaitJobFinishedError::Stream(e)).with_span_trace();
                    }
                    None => {
                        break Err(WaitJobFinishedError::UnexpectedObject(
                            "nothing: the watch stream was closed".to_string(),
                        ))
                        .with_span_trace();
                    }
                };

                match terminal_outcome(&updated) {
                    Some(JobOutcome::Succeeded) => {
                        info!("Job '{}' completed.", job_name);
                        break Ok(JobOutcome::Succeeded);
                    }
                    Some(JobOutcome::Failed(message)) => {
                        error!("Job '{}' failed to complete successfully: {}", job_name, message);
                        break Ok(JobOutcome::Failed(message));
                    }
                    Some(JobOutcome::TimedOut) | None => {
                        trace!("Job '{}' has no terminal condition yet.", job_name);
                    }
                }
            }
        }
    }
}
