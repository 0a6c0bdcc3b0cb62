use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::parse_duration;

#[derive(Debug, Parser)]
#[command(version, about = "Manually trigger a CronJob and wait for the job it spawns")]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub(crate) subcommand: SubCommands,

    /// YAML file describing the CronJob; built-in hello-world CronJob if omitted
    #[clap(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Kubeconfig to use instead of the default inference chain
    #[clap(long, global = true)]
    pub(crate) kubeconfig: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum SubCommands {
    /// Create the CronJob if missing, run it once now and wait for the job to finish
    Trigger {
        #[clap(short, long)]
        namespace: Option<String>,

        /// CronJob name
        #[clap(long)]
        name: Option<String>,

        /// Give up waiting after this long, e.g. "90s" or "5m"
        #[clap(short, long, value_parser = parse_duration)]
        timeout: Option<Duration>,
    },

    /// Print version and build information
    Version {},
}
