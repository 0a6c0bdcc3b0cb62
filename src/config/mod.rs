mod raw;

pub(crate) use self::raw::parse_duration;
pub use self::raw::ConfigParseError;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument};

use self::raw::RawConfig;
use crate::kubernetes_objects::cronjob::CronJobTemplate;

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub namespace: String,
    pub cronjob: CronJobTemplate,
    /// External deadline for the whole trigger, measured from its start
    pub timeout: Option<Duration>,
}

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Cannot read config file '{0}': {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Cannot parse config file '{0}': {1}")]
    Parse(PathBuf, serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] ConfigParseError),
}

/// Command line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConfigOverrides {
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub timeout: Option<Duration>,
}

impl Config {
    #[instrument("config/load", skip(overrides))]
    pub(crate) async fn load(
        path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Config, ConfigLoadError> {
        let mut raw = match path {
            Some(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| ConfigLoadError::Read(path.to_path_buf(), e))?;
                info!("Loaded config file '{}'.", path.display());
                serde_yaml::from_str::<RawConfig>(&content)
                    .map_err(|e| ConfigLoadError::Parse(path.to_path_buf(), e))?
            }
            None => {
                info!("No config file given. Using built-in hello-world CronJob.");
                RawConfig::default()
            }
        };

        if let Some(namespace) = overrides.namespace {
            raw.namespace = namespace;
        }
        if let Some(name) = overrides.name {
            raw.cronjob.name = name;
        }
        if overrides.timeout.is_some() {
            raw.timeout = overrides.timeout;
        }

        Ok(Config::try_from(raw)?)
    }
}
