use thiserror::Error;
use tracing_error::{ExtractSpanTrace, SpanTrace};

use crate::error::SpannedErr;
use crate::kubernetes_objects::cluster::ClusterError;
use crate::kubernetes_objects::job::ManualJobError;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("CronJob '{0}' could not be ensured: {1}")]
    EnsureCronJob(String, SpannedErr<ClusterError>),

    #[error("Job could not be launched from CronJob '{0}': {1}")]
    LaunchJob(String, SpannedErr<LaunchJobError>),

    #[error("Job '{0}' could not be watched: {1}")]
    WaitJobFinished(String, SpannedErr<WaitJobFinishedError>),

    #[error("Job '{0}' failed to complete successfully: {1}")]
    JobFailed(String, String, SpanTrace),

    #[error("Timeout reached waiting for {0}")]
    Timeout(String, SpanTrace),
}

#[derive(Error, Debug)]
pub enum LaunchJobError {
    #[error("{0}")]
    Manifest(#[from] ManualJobError),

    #[error("{0}")]
    Cluster(#[from] ClusterError),
}

#[derive(Error, Debug)]
pub enum WaitJobFinishedError {
    #[error("Failed to subscribe to job events: {0}")]
    Subscribe(ClusterError),

    #[error("Watch stream error: {0}")]
    Stream(kube::Error),

    #[error("Couldn't interpret watch event as a job; object was {0}")]
    UnexpectedObject(String),
}

impl ExtractSpanTrace for TriggerError {
    fn span_trace(&self) -> Option<&SpanTrace> {
        match self {
            TriggerError::EnsureCronJob(_, e) => e.span_trace(),
            TriggerError::LaunchJob(_, e) => e.span_trace(),
            TriggerError::WaitJobFinished(_, e) => e.span_trace(),
            TriggerError::JobFailed(_, _, span_trace) => Some(span_trace),
            TriggerError::Timeout(_, span_trace) => Some(span_trace),
        }
    }
}
