//! The `capfox` CLI surface: `start` runs the long-lived
//! server; the rest are thin clients talking to a running instance over
//! HTTP, or (for `run`) a local admission-gated process wrapper.

mod ask;
mod client;
mod notify;
mod reload;
pub mod run;
mod start;
mod status;
mod stats;
mod stop;
mod tui;

use crate::config::CapfoxConfig;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "capfox", version, about = "Single-node admission controller for resource-heavy task launches")]
pub struct Cli {
    /// Path to the YAML config file (env: CAPFOX_CONFIG).
    #[arg(long, env = "CAPFOX_CONFIG", default_value = "capfox.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the server in the foreground.
    Start,
    /// Send a graceful-shutdown request to a running instance.
    Stop,
    /// Send SIGHUP to a running instance to reload its configuration.
    Reload,
    /// Print a human-readable summary of the current system state.
    Status,
    /// Ask whether a task may run.
    Ask {
        #[arg(long)]
        task: String,
        #[arg(long, default_value_t = 1)]
        complexity: u64,
        /// Use the threshold-only `/ask` endpoint instead of `/v2/ask`.
        #[arg(long)]
        legacy: bool,
    },
    /// Run a command, gated by an admission check.
    Run {
        /// Task name charged to the admission check; defaults to the
        /// command's basename.
        #[arg(long)]
        task: Option<String>,
        #[arg(long, default_value_t = 1)]
        complexity: u64,
        #[arg(trailing_var_arg = true, required = true)]
        cmd: Vec<String>,
    },
    /// Notify the learning engine that a task has started.
    Notify {
        #[arg(long)]
        task: String,
        #[arg(long, default_value_t = 1)]
        complexity: u64,
    },
    /// Launch a live terminal dashboard of system state.
    Tui,
    /// Print prediction-model statistics.
    Stats {
        #[arg(long)]
        task: Option<String>,
    },
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = CapfoxConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    match cli.command {
        Command::Start => start::run(config, cli.config).await,
        Command::Stop => stop::run(&config),
        Command::Reload => reload::run(&config),
        Command::Status => status::run(&config).await,
        Command::Ask { task, complexity, legacy } => ask::run(&config, &task, complexity, legacy).await,
        Command::Run { task, complexity, cmd } => {
            let task = task.unwrap_or_else(|| default_task_name(&cmd));
            let code = run::run(&config, &task, complexity, &cmd).await;
            std::process::exit(code);
        }
        Command::Notify { task, complexity } => notify::run(&config, &task, complexity).await,
        Command::Tui => tui::run(&config).await,
        Command::Stats { task } => stats::run(&config, task.as_deref()).await,
    }
}

fn default_task_name(cmd: &[String]) -> String {
    cmd.first()
        .map(|program| {
            std::path::Path::new(program)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(program)
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string())
}
