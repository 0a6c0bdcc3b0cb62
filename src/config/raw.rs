use std::time::Duration;

use duration_string::DurationString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use super::Config;
use crate::kubernetes_objects::cronjob::{ContainerTemplate, CronJobTemplate};

/// Kubernetes rejects Job names longer than a DNS-1123 label.
const MAX_JOB_NAME_LEN: usize = 63;
/// `-` followed by a hyphenated UUID.
const JOB_NAME_SUFFIX_LEN: usize = 37;

#[cfg_attr(test, derive(PartialEq))]
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub(super) struct RawConfig {
    #[serde(default = "default_namespace")]
    pub(super) namespace: String,

    #[serde(default)]
    pub(super) cronjob: RawCronJob,

    /// Deadline for the whole trigger, e.g. "5m"
    #[serde(default, deserialize_with = "deserialize_timeout")]
    pub(super) timeout: Option<Duration>,
}

#[cfg_attr(test, derive(PartialEq))]
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub(super) struct RawCronJob {
    #[serde(default = "default_name")]
    pub(super) name: String,

    #[serde(default = "default_schedule")]
    pub(super) schedule: String,

    #[serde(default = "default_history_limit")]
    pub(super) successful_jobs_history_limit: i32,

    #[serde(default)]
    pub(super) suspend: bool,

    #[serde(default)]
    pub(super) container: RawContainer,

    #[serde(default = "default_restart_policy")]
    pub(super) restart_policy: String,
}

#[cfg_attr(test, derive(PartialEq))]
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub(super) struct RawContainer {
    /// Defaults to the CronJob name
    #[serde(default)]
    pub(super) name: Option<String>,

    #[serde(default = "default_image")]
    pub(super) image: String,

    #[serde(default = "default_image_pull_policy")]
    pub(super) image_pull_policy: String,

    #[serde(default = "default_command")]
    pub(super) command: Vec<String>,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            cronjob: RawCronJob::default(),
            timeout: None,
        }
    }
}

impl Default for RawCronJob {
    fn default() -> Self {
        Self {
            name: default_name(),
            schedule: default_schedule(),
            successful_jobs_history_limit: default_history_limit(),
            suspend: false,
            container: RawContainer::default(),
            restart_policy: default_restart_policy(),
        }
    }
}

impl Default for RawContainer {
    fn default() -> Self {
        Self {
            name: None,
            image: default_image(),
            image_pull_policy: default_image_pull_policy(),
            command: default_command(),
        }
    }
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| parse_duration(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Parses human durations such as "90s" or "5m".
pub(crate) fn parse_duration(s: &str) -> Result<Duration, String> {
    s.parse::<DurationString>()
        .map(Duration::from)
        .map_err(|e| format!("invalid duration '{s}': {e}"))
}

fn default_namespace() -> String {
    "default".to_string()
}
fn default_name() -> String {
    "hello-world".to_string()
}
fn default_schedule() -> String {
    "0 */10 * * *".to_string()
}
const fn default_history_limit() -> i32 {
    3
}
fn default_restart_policy() -> String {
    "Never".to_string()
}
fn default_image() -> String {
    "alpine".to_string()
}
fn default_image_pull_policy() -> String {
    "IfNotPresent".to_string()
}
fn default_command() -> Vec<String> {
    vec![
        "/bin/sh".to_string(),
        "-c".to_string(),
        r#"echo "Hello World""#.to_string(),
    ]
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigParseError {
    #[error("{field} '{value}' is not a valid DNS-1123 label")]
    InvalidName { field: &'static str, value: String },

    #[error(
        "CronJob name '{name}' is too long: generated job names would exceed 63 characters"
    )]
    CronJobNameTooLong { name: String },

    #[error("Container command must not be empty")]
    EmptyCommand,

    #[error("Restart policy '{0}' is not allowed for jobs (expected 'Never' or 'OnFailure')")]
    InvalidRestartPolicy(String),
}

pub(super) fn validate_dns_label(field: &'static str, value: &str) -> Result<(), ConfigParseError> {
    let valid = !value.is_empty()
        && value.len() <= MAX_JOB_NAME_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !value.starts_with('-')
        && !value.ends_with('-');
    if valid {
        Ok(())
    } else {
        Err(ConfigParseError::InvalidName {
            field,
            value: value.to_string(),
        })
    }
}

pub(super) fn validate_cronjob_name(name: &str) -> Result<(), ConfigParseError> {
    validate_dns_label("CronJob name", name)?;
    if name.len() + JOB_NAME_SUFFIX_LEN > MAX_JOB_NAME_LEN {
        return Err(ConfigParseError::CronJobNameTooLong {
            name: name.to_string(),
        });
    }
    Ok(())
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigParseError;
    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        validate_dns_label("Namespace", &raw.namespace)?;

        let cronjob = raw.cronjob;
        validate_cronjob_name(&cronjob.name)?;

        if cronjob.container.command.is_empty() {
            return Err(ConfigParseError::EmptyCommand);
        }
        if !matches!(cronjob.restart_policy.as_str(), "Never" | "OnFailure") {
            return Err(ConfigParseError::InvalidRestartPolicy(
                cronjob.restart_policy,
            ));
        }

        let container = ContainerTemplate {
            name: cronjob
                .container
                .name
                .unwrap_or_else(|| cronjob.name.clone()),
            image: cronjob.container.image,
            image_pull_policy: cronjob.container.image_pull_policy,
            command: cronjob.container.command,
        };

        Ok(Config {
            namespace: raw.namespace,
            cronjob: CronJobTemplate {
                name: cronjob.name,
                schedule: cronjob.schedule,
                successful_jobs_history_limit: cronjob.successful_jobs_history_limit,
                suspend: cronjob.suspend,
                container,
                restart_policy: cronjob.restart_policy,
            },
            timeout: raw.timeout,
        })
    }
}
