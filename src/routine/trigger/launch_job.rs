use k8s_openapi::api::batch::v1::{CronJob, Job};
use tracing::{Instrument, info, instrument, trace_span};

use crate::error::{SpannedErr, SpannedExt};
use crate::kubernetes_objects::cluster::BatchClient;
use crate::kubernetes_objects::job::manual_job_from_cronjob;

use super::error::{LaunchJobError, TriggerError};

/// Creates one new Job from the CronJob's job template, owned by that CronJob.
#[instrument(
    "launch_job",
    skip(client, cronjob),
    fields(cronjob_name = cronjob.metadata.name.as_deref().unwrap_or("<unknown>"))
)]
pub(super) async fn launch_job<C: BatchClient>(
    client: &C,
    cronjob: &CronJob,
) -> Result<Job, TriggerError> {
    let cronjob_name = cronjob.metadata.name.as_deref().unwrap_or("<unknown>");
    let into_trigger_error =
        |e: SpannedErr<LaunchJobError>| TriggerError::LaunchJob(cronjob_name.to_string(), e);

    let manifest = manual_job_from_cronjob(cronjob)
        .with_span_trace()
        .map_err(|e| into_trigger_error(e.map(LaunchJobError::from)))?;

    // Both are set by manual_job_from_cronjob.
    let namespace = manifest.metadata.namespace.as_deref().unwrap_or_default();
    let job_name = manifest.metadata.name.as_deref().unwrap_or_default();

    let job = async {
        client
            .create_job(namespace, &manifest)
            .await
            .map_err(LaunchJobError::from)
            .with_span_trace()
    }
    .instrument(trace_span!("create_job", kubernetes_namespace = %namespace, job_name = %job_name))
    .await
    .map_err(into_trigger_error)?;

    info!(
        "Job '{}' created from CronJob '{}'.",
        job.metadata.name.as_deref().unwrap_or(job_name),
        cronjob_name
    );
    Ok(job)
}
