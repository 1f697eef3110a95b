//! nativedeps CLI - provision native dependencies into an installation root
//!
//! Usage:
//!   nativedeps cassandra <root> <version> [--update]
//!   nativedeps libtorch <root> <version> [accelerator]
//!   nativedeps ocid <root> <token> [--region <mcc>]...

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use nativedeps::core::config::DEFAULT_USER_AGENT;
use nativedeps::{
    AcquireMode, DEFAULT_ACCELERATOR, DEFAULT_REGIONS, HttpSettings, RunConfig, SystemRunner,
    TargetEnvironment, output, workflows,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nativedeps")]
#[command(about = "Provision native dependencies into a project-local layout")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// User-Agent header sent with every download
    #[arg(long, global = true, env = "NATIVEDEPS_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Overall HTTP timeout in seconds (clamped to 5..=3600; none by default)
    #[arg(long, global = true, env = "NATIVEDEPS_HTTP_TIMEOUT")]
    http_timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone, build and install the DataStax C/C++ driver
    Cassandra {
        /// Installation root
        root: PathBuf,

        /// Driver version, as embedded in the library file name (e.g. 2.17.1)
        version: String,

        /// Fast-forward an existing checkout before building
        #[arg(long)]
        update: bool,
    },

    /// Download and unpack the prebuilt LibTorch distribution
    Libtorch {
        /// Installation root
        root: PathBuf,

        /// LibTorch version (e.g. 2.5.0)
        version: String,

        /// Accelerator tag (cpu, cu121, ...)
        #[arg(default_value = DEFAULT_ACCELERATOR)]
        accelerator: String,
    },

    /// Download OpenCellID CSVs into data/ocid/
    Ocid {
        /// Installation root
        root: PathBuf,

        /// OpenCellID API token
        #[arg(env = "OPENCELLID_TOKEN", hide_env_values = true)]
        token: String,

        /// Mobile country code to fetch; repeatable (defaults to 310-316)
        #[arg(long = "region", value_name = "MCC")]
        regions: Vec<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let http = HttpSettings::new(cli.user_agent, cli.http_timeout);
    let env = TargetEnvironment::detect();

    match cli.command {
        Commands::Cassandra {
            root,
            version,
            update,
        } => {
            let config = RunConfig::new(root, env, http);
            let mode = if update {
                AcquireMode::Update
            } else {
                AcquireMode::CloneIfAbsent
            };
            workflows::cassandra::provision(&config, &SystemRunner, &version, mode)
                .with_context(|| format!("Failed to provision cassandra {}", version))?;
        }

        Commands::Libtorch {
            root,
            version,
            accelerator,
        } => {
            let config = RunConfig::new(root, env, http);
            workflows::libtorch::provision(&config, &version, &accelerator)
                .with_context(|| format!("Failed to provision libtorch {}", version))?;
        }

        Commands::Ocid {
            root,
            token,
            regions,
        } => {
            let config = RunConfig::new(root, env, http);
            let regions = if regions.is_empty() {
                DEFAULT_REGIONS.to_vec()
            } else {
                regions
            };
            let report = workflows::ocid::provision(&config, &token, &regions)
                .context("Failed to provision OpenCellID data")?;

            if !report.is_complete() {
                output::info(&format!(
                    "{} of {} region(s) installed",
                    report.installed.len(),
                    regions.len()
                ));
                bail!("failed regions: {:?}", report.failed_regions());
            }
        }
    }

    Ok(())
}
