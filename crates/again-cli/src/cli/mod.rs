//! CLI for the again retry runner.

mod child;
mod commands;
mod console;

use again_core::config::{self, AgainConfig, RetryConfig};
use again_core::retry::{BackoffMode, ClassificationLists, RetryPolicy};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

pub use child::CommandError;

use commands::{run_completions, run_man, run_retry, run_schedule};

/// Top-level CLI for the again retry runner.
#[derive(Debug, Parser)]
#[command(name = "again")]
#[command(about = "again: run a command until it succeeds, with fixed, linear or exponential backoff", long_about = None)]
pub struct Cli {
    /// Read defaults from this file instead of ~/.config/again/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Backoff knobs shared by `run` and `schedule`. Unset flags use config values.
#[derive(Debug, Clone, Default, Args)]
pub struct BackoffArgs {
    /// Backoff mode: fixed, linear or exponential.
    #[arg(long, value_name = "MODE")]
    pub mode: Option<BackoffMode>,

    /// Fixed wait, linear increment or exponential base, in seconds.
    #[arg(long, visible_alias = "retry-delay", value_name = "N")]
    pub multiplier: Option<u32>,

    /// Retries allowed after the first attempt.
    #[arg(long, value_name = "N")]
    pub max_retry: Option<u32>,
}

impl BackoffArgs {
    /// Apply flag overrides on top of config defaults.
    pub fn to_policy(&self, defaults: &RetryConfig) -> RetryPolicy {
        let mut policy = defaults.to_policy();
        if let Some(mode) = self.mode {
            policy.mode = mode;
        }
        if let Some(multiplier) = self.multiplier {
            policy.multiplier = multiplier;
        }
        if let Some(max_retry) = self.max_retry {
            policy.max_retry = max_retry;
        }
        policy
    }
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub backoff: BackoffArgs,

    /// Error text that fails immediately without retrying (repeatable, exact match).
    #[arg(long = "stop-on", value_name = "TEXT")]
    pub stop_on: Vec<String>,

    /// Error text that ends retrying quietly with a warning (repeatable, exact match).
    #[arg(long = "continue-on", value_name = "TEXT")]
    pub continue_on: Vec<String>,

    /// Prefix for every backoff message.
    #[arg(long, value_name = "TEXT")]
    pub message: Option<String>,

    /// Report every retry decision as a warning, not only the waits.
    #[arg(long)]
    pub warning: bool,

    /// Print verbose retry decisions to stderr.
    #[arg(long, short)]
    pub verbose: bool,

    /// Command to run, followed by its arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl RunArgs {
    /// Policy from config defaults plus flags. Flag lists extend config lists.
    pub fn to_policy(&self, defaults: &RetryConfig) -> RetryPolicy {
        let mut policy = self.backoff.to_policy(defaults);
        let config_lists = policy.lists;
        policy.lists = ClassificationLists::new(
            config_lists.stop_on.into_iter().chain(self.stop_on.iter().cloned()),
            config_lists
                .continue_on
                .into_iter()
                .chain(self.continue_on.iter().cloned()),
        );
        if self.message.is_some() {
            policy.message = self.message.clone();
        }
        policy.warning |= self.warning;
        policy
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run a command, retrying it on failure.
    Run(RunArgs),

    /// Show the waits a policy would apply if every attempt failed.
    Schedule {
        #[command(flatten)]
        backoff: BackoffArgs,
    },

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff).
    Man,
}

fn load_config(path: Option<&PathBuf>) -> Result<AgainConfig> {
    let cfg = match path {
        Some(p) => config::load_from(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

impl CliCommand {
    /// `logs_on_stderr` is set when tracing fell back to stderr.
    pub async fn run_from_args(logs_on_stderr: bool) -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run(args) => {
                let cfg = load_config(cli.config.as_ref())?;
                run_retry(&cfg.retry_or_default(), args, logs_on_stderr).await?;
            }
            CliCommand::Schedule { backoff } => {
                let cfg = load_config(cli.config.as_ref())?;
                run_schedule(&backoff.to_policy(&cfg.retry_or_default()))?;
            }
            CliCommand::Completions { shell } => run_completions(shell)?,
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
