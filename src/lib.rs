use std::future::Future;
use std::time::Duration;

use self::cli::{Cli, SubCommands};
use self::config::{Config, ConfigOverrides};
use self::routine::shutdown::Shutdown;
use self::routine::trigger::TriggerContext;
use self::version::VersionInfo;
use clap::Parser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use thiserror::Error;
use tokio::select;
use tracing::{info, warn};
use tracing_error::ExtractSpanTrace;
use tracing_error::SpanTrace;

pub(crate) mod cli;
pub mod config;
pub mod error;
pub(crate) mod kubernetes_objects;
pub(crate) mod routine;
pub mod version;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to load config.\n{0}")]
    ConfigError(#[from] config::ConfigLoadError),

    #[error("Failed to read kubeconfig.\n{0}")]
    KubeconfigError(#[from] kube::config::KubeconfigError),

    #[error("Failed to initialize kubernetes client.\n{0}")]
    KubeClientError(#[from] kube::Error),

    #[error("Trigger routine stopped due to following error:\n{0}")]
    TriggerError(#[from] crate::routine::trigger::error::TriggerError),
}

impl ExtractSpanTrace for AppError {
    fn span_trace(&self) -> Option<&SpanTrace> {
        match self {
            AppError::TriggerError(e) => e.span_trace(),
            _ => None,
        }
    }
}

pub async fn app() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.subcommand {
        SubCommands::Version {} => {
            println!("{}", VersionInfo::get());
        }
        SubCommands::Trigger {
            namespace,
            name,
            timeout,
        } => {
            let overrides = ConfigOverrides {
                namespace,
                name,
                timeout,
            };
            let config = Config::load(cli.config.as_deref(), overrides).await?;

            info!("Config Loaded.");

            let client = match &cli.kubeconfig {
                Some(path) => {
                    let kubeconfig = Kubeconfig::read_from(path)?;
                    let options = KubeConfigOptions::default();
                    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &options).await?;
                    kube::Client::try_from(config)?
                }
                None => kube::Client::try_default().await?,
            };

            info!("Kubernetes Client Initialized.");

            let cancel = cancellation(Shutdown::new(), config.timeout);
            let context = TriggerContext::new(config, client);
            context.run(cancel).await?;
        }
    }

    Ok(())
}

/// Resolves on SIGINT/SIGTERM or once `timeout` has passed since this call.
fn cancellation(shutdown: Shutdown, timeout: Option<Duration>) -> impl Future<Output = ()> {
    let deadline = timeout.map(|timeout| tokio::time::Instant::now() + timeout);
    async move {
        match deadline {
            Some(deadline) => select! {
                signal = shutdown.wait() => warn!("Cancelling trigger: received {}.", signal),
                _ = tokio::time::sleep_until(deadline) => warn!("Cancelling trigger: request timeout reached."),
            },
            None => {
                let signal = shutdown.wait().await;
                warn!("Cancelling trigger: received {}.", signal);
            }
        }
    }
}
