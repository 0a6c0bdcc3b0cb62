use k8s_openapi::api::batch::v1::CronJob;
use tracing::{Instrument, info, instrument, trace_span, warn};

use crate::error::SpannedExt;
use crate::kubernetes_objects::cluster::BatchClient;

use super::error::TriggerError;

/// Creates the CronJob, or returns the existing one of the same name untouched.
///
/// An existing CronJob is not reconciled against `desired`.
#[instrument(
    "ensure_cronjob",
    skip(client, desired),
    fields(kubernetes_namespace = %namespace, cronjob_name = %name)
)]
pub(super) async fn ensure_cronjob<C: BatchClient>(
    client: &C,
    namespace: &str,
    name: &str,
    desired: &CronJob,
) -> Result<CronJob, TriggerError> {
    let created = client
        .create_cronjob(namespace, desired)
        .instrument(trace_span!("create_cronjob"))
        .await;

    match created {
        Ok(cronjob) => {
            info!("CronJob '{}' created.", name);
            Ok(cronjob)
        }
        Err(e) if e.is_already_exists() => {
            warn!("CronJob '{}' already exists. Using the existing one as-is.", name);
            async { client.get_cronjob(namespace, name).await.with_span_trace() }
                .instrument(trace_span!("get_cronjob"))
                .await
                .map_err(|e| TriggerError::EnsureCronJob(name.to_string(), e))
        }
        Err(e) => Err(e)
            .with_span_trace()
            .map_err(|e| TriggerError::EnsureCronJob(name.to_string(), e)),
    }
}
