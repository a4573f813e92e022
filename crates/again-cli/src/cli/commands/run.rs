//! `again run -- <command>` – retry an external command.

use again_core::config::RetryConfig;
use again_core::retry::{Executor, Outcome, RetryPolicy, Sleeper, ThreadSleeper};
use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::cli::child::{self, CapturedOutput, CommandError};
use crate::cli::console::ConsoleSink;
use crate::cli::RunArgs;

/// Blocking retry loop for one command line. Runs on the caller's thread.
pub fn retry_command<Z: Sleeper>(
    policy: RetryPolicy,
    command: &[String],
    sink: ConsoleSink,
    sleeper: Z,
) -> Result<Result<Outcome<CapturedOutput>, CommandError>> {
    let (program, args) = command
        .split_first()
        .context("no command given")?;
    let mut exec = Executor::new(policy)
        .context("invalid retry policy")?
        .with_sink(sink)
        .with_sleeper(sleeper);
    tracing::info!("running {:?} under retry policy {:?}", command, exec.policy());
    Ok(exec.execute(|| child::run_once(program, args)))
}

/// Replay the last attempt's output, then turn the outcome into the CLI result.
pub fn report_outcome<O: Write, E: Write>(
    outcome: Result<Outcome<CapturedOutput>, CommandError>,
    out: &mut O,
    err: &mut E,
) -> Result<()> {
    match outcome {
        Ok(Outcome::Completed(output)) => {
            output
                .replay_to(out, err)
                .context("write command output")?;
            Ok(())
        }
        Ok(Outcome::Skipped { reason }) => {
            tracing::info!("command skipped: {}", reason);
            Ok(())
        }
        Err(e) => {
            if let Some(output) = e.output() {
                output
                    .replay_to(out, err)
                    .context("write command output")?;
            }
            // Propagated as-is so main can reuse the child's exit code.
            Err(anyhow::Error::new(e))
        }
    }
}

/// `logs_on_stderr`: tracing already writes to stderr, so the console sink
/// must not mirror into it.
pub async fn run_retry(
    defaults: &RetryConfig,
    args: RunArgs,
    logs_on_stderr: bool,
) -> Result<()> {
    let policy = args.to_policy(defaults);
    let sink = ConsoleSink::new(args.verbose, !logs_on_stderr);
    let command = args.command;

    let outcome = tokio::task::spawn_blocking(move || {
        retry_command(policy, &command, sink, ThreadSleeper)
    })
    .await
    .context("retry task join")??;

    report_outcome(outcome, &mut io::stdout().lock(), &mut io::stderr().lock())
}
