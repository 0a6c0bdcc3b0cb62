use std::collections::BTreeMap;

use k8s_openapi::Resource;
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use thiserror::Error;
use uuid::Uuid;

/// Annotation `kubectl create job --from=cronjob/...` stamps on manual runs.
pub(crate) const INSTANTIATE_ANNOTATION: &str = "cronjob.kubernetes.io/instantiate";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ManualJobError {
    #[error("CronJob has no '{0}' in its metadata")]
    MissingMetadata(&'static str),

    #[error("CronJob '{0}' has no job template spec")]
    MissingJobTemplate(String),
}

/// Name for a one-off run of `cronjob_name`, unique per call.
pub(crate) fn manual_job_name(cronjob_name: &str) -> String {
    format!("{}-{}", cronjob_name, Uuid::new_v4())
}

/// Owner reference pointing at exactly this CronJob.
///
/// Objects returned by the API server carry no `apiVersion`/`kind`, so the type
/// descriptor comes from the k8s-openapi constants instead of the object.
pub(crate) fn cronjob_owner_reference(cronjob: &CronJob) -> Result<OwnerReference, ManualJobError> {
    let name = cronjob
        .metadata
        .name
        .clone()
        .ok_or(ManualJobError::MissingMetadata("name"))?;
    let uid = cronjob
        .metadata
        .uid
        .clone()
        .ok_or(ManualJobError::MissingMetadata("uid"))?;

    Ok(OwnerReference {
        api_version: CronJob::API_VERSION.to_string(),
        kind: CronJob::KIND.to_string(),
        name,
        uid,
        ..Default::default()
    })
}

/// Builds a Job from the CronJob's job template, the same way a manual
/// `kubectl create job --from=cronjob/<name>` would.
pub(crate) fn manual_job_from_cronjob(cronjob: &CronJob) -> Result<Job, ManualJobError> {
    let owner = cronjob_owner_reference(cronjob)?;
    let namespace = cronjob
        .metadata
        .namespace
        .clone()
        .ok_or(ManualJobError::MissingMetadata("namespace"))?;

    let template = &cronjob
        .spec
        .as_ref()
        .ok_or_else(|| ManualJobError::MissingJobTemplate(owner.name.clone()))?
        .job_template;
    let spec = template
        .spec
        .clone()
        .ok_or_else(|| ManualJobError::MissingJobTemplate(owner.name.clone()))?;

    let template_meta = template.metadata.clone().unwrap_or_default();
    let mut annotations: BTreeMap<String, String> =
        template_meta.annotations.unwrap_or_default();
    annotations.insert(INSTANTIATE_ANNOTATION.to_string(), "manual".to_string());

    Ok(Job {
        metadata: ObjectMeta {
            name: Some(manual_job_name(&owner.name)),
            namespace: Some(namespace),
            labels: template_meta.labels,
            annotations: Some(annotations),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(spec),
        status: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::batch::v1::{CronJobSpec, JobSpec, JobTemplateSpec};
    use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};

    fn fetched_cronjob() -> CronJob {
        CronJob {
            metadata: ObjectMeta {
                name: Some("hello-world".to_string()),
                namespace: Some("default".to_string()),
                uid: Some("0b3c6f2e-7a55-4d8e-9a57-3e0f4a1f6c11".to_string()),
                resource_version: Some("4242".to_string()),
                ..Default::default()
            },
            spec: Some(CronJobSpec {
                schedule: "0 */10 * * *".to_string(),
                job_template: JobTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(BTreeMap::from([(
                            "app".to_string(),
                            "hello".to_string(),
                        )])),
                        ..Default::default()
                    }),
                    spec: Some(JobSpec {
                        backoff_limit: Some(2),
                        template: PodTemplateSpec {
                            metadata: None,
                            spec: Some(PodSpec {
                                restart_policy: Some("Never".to_string()),
                                containers: vec![Container {
                                    name: "hello-world".to_string(),
                                    image: Some("alpine".to_string()),
                                    ..Default::default()
                                }],
                                ..Default::default()
                            }),
                        },
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            status: None,
        }
    }

    #[test]
    fn test_owner_reference_uses_constant_type_descriptor() {
        let owner = cronjob_owner_reference(&fetched_cronjob()).unwrap();
        assert_eq!(owner.api_version, "batch/v1");
        assert_eq!(owner.kind, "CronJob");
        assert_eq!(owner.name, "hello-world");
        assert_eq!(owner.uid, "0b3c6f2e-7a55-4d8e-9a57-3e0f4a1f6c11");
    }

    #[test]
    fn test_owner_reference_requires_uid() {
        let mut cronjob = fetched_cronjob();
        cronjob.metadata.uid = None;
        assert_eq!(
            cronjob_owner_reference(&cronjob),
            Err(ManualJobError::MissingMetadata("uid"))
        );
    }

    #[test]
    fn test_manual_job_copies_template_verbatim() {
        let cronjob = fetched_cronjob();
        let job = manual_job_from_cronjob(&cronjob).unwrap();

        assert_eq!(
            job.spec,
            cronjob.spec.as_ref().unwrap().job_template.spec.clone()
        );
        assert_eq!(job.metadata.namespace.as_deref(), Some("default"));
        assert_eq!(
            job.metadata.labels.unwrap().get("app").map(String::as_str),
            Some("hello")
        );
        assert_eq!(
            job.metadata
                .annotations
                .unwrap()
                .get(INSTANTIATE_ANNOTATION)
                .map(String::as_str),
            Some("manual")
        );
    }

    #[test]
    fn test_manual_job_names_never_collide() {
        let cronjob = fetched_cronjob();
        let first = manual_job_from_cronjob(&cronjob).unwrap();
        let second = manual_job_from_cronjob(&cronjob).unwrap();

        let first_name = first.metadata.name.unwrap();
        let second_name = second.metadata.name.unwrap();
        assert!(first_name.starts_with("hello-world-"));
        assert!(second_name.starts_with("hello-world-"));
        assert_ne!(first_name, second_name);
        assert_eq!(first_name.len(), "hello-world-".len() + 36);
    }

    #[test]
    fn test_manual_job_without_template_is_rejected() {
        let mut cronjob = fetched_cronjob();
        cronjob.spec.as_mut().unwrap().job_template.spec = None;
        assert_eq!(
            manual_job_from_cronjob(&cronjob),
            Err(ManualJobError::MissingJobTemplate("hello-world".to_string()))
        );
    }
}
