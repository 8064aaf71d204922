use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use codeteach::config::Config;
use codeteach::harness::HarnessMode;

mod cmd;

#[derive(Parser)]
#[command(name = "codeteach")]
#[command(version, about = "Coding-practice tutor backed by a local language model")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Base URL of the OpenAI-compatible model server. Overrides codeteach.toml.
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Model name to request. Overrides codeteach.toml.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Path to the problem catalog (JSON), relative to the project directory
    #[arg(long = "problems", global = true)]
    pub problems_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List problems in the catalog
    Problems {
        /// Only show problems of this difficulty (easy, medium, hard)
        #[arg(short, long)]
        difficulty: Option<String>,
        /// Only show problems tagged with this topic
        #[arg(short, long)]
        topic: Option<String>,
    },
    /// Talk to the tutor about a problem
    Chat {
        #[arg(short, long)]
        problem: String,
    },
    /// Run a solution against the problem's examples
    Run {
        #[arg(short, long)]
        problem: String,
        file: PathBuf,
    },
    /// Run a solution and record the result in your progress
    Submit {
        #[arg(short, long)]
        problem: String,
        file: PathBuf,
    },
    /// Show completed and attempted problems
    Progress,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default codeteach.toml file
    Init,
}

/// Stderr logging, plus a daily log file when `log_dir` is given.
fn init_tracing(verbose: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_directive = if verbose { "codeteach=debug" } else { "codeteach=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "codeteach.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    if let Commands::Config { command } = &cli.command {
        let _guard = init_tracing(cli.verbose, None);
        return cmd::cmd_config(&project_dir, command.clone());
    }

    let config = Config::new(
        project_dir,
        cli.verbose,
        cli.endpoint.clone(),
        cli.model.clone(),
        cli.problems_file.clone(),
    )?;
    config.ensure_directories()?;
    let _guard = init_tracing(cli.verbose, Some(&config.log_dir));

    match &cli.command {
        Commands::Problems { difficulty, topic } => {
            cmd::cmd_problems(&config, difficulty.as_deref(), topic.as_deref())?;
        }
        Commands::Chat { problem } => cmd::cmd_chat(&config, problem).await?,
        Commands::Run { problem, file } => {
            cmd::cmd_run(&config, problem, file, HarnessMode::Run).await?;
        }
        Commands::Submit { problem, file } => {
            cmd::cmd_run(&config, problem, file, HarnessMode::Submit).await?;
        }
        Commands::Progress => cmd::cmd_progress(&config)?,
        Commands::Config { command } => cmd::cmd_config(&config.project_dir, command.clone())?,
    }

    Ok(())
}
