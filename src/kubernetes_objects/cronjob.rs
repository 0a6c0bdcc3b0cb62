use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Desired shape of the CronJob the routine triggers.
#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) struct CronJobTemplate {
    pub(crate) name: String,
    pub(crate) schedule: String,
    pub(crate) successful_jobs_history_limit: i32,
    pub(crate) suspend: bool,
    pub(crate) container: ContainerTemplate,
    pub(crate) restart_policy: String,
}

#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) struct ContainerTemplate {
    pub(crate) name: String,
    pub(crate) image: String,
    pub(crate) image_pull_policy: String,
    pub(crate) command: Vec<String>,
}

impl CronJobTemplate {
    pub(crate) fn to_cronjob(&self, namespace: &str) -> CronJob {
        CronJob {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: Some(CronJobSpec {
                schedule: self.schedule.clone(),
                successful_jobs_history_limit: Some(self.successful_jobs_history_limit),
                suspend: Some(self.suspend),
                job_template: JobTemplateSpec {
                    metadata: None,
                    spec: Some(JobSpec {
                        template: PodTemplateSpec {
                            metadata: None,
                            spec: Some(PodSpec {
                                restart_policy: Some(self.restart_policy.clone()),
                                containers: vec![Container {
                                    name: self.container.name.clone(),
                                    image: Some(self.container.image.clone()),
                                    image_pull_policy: Some(
                                        self.container.image_pull_policy.clone(),
                                    ),
                                    command: Some(self.container.command.clone()),
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
}
