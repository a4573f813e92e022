//! `again schedule` – preview backoff waits.

use again_core::retry::RetryPolicy;
use anyhow::{Context, Result};

/// Retries listed individually before the preview is cut short.
const PREVIEW_LIMIT: u32 = 100;

/// One line per retry (at most `PREVIEW_LIMIT`), then the worst-case total.
pub fn schedule_lines(policy: &RetryPolicy) -> Vec<String> {
    let mut lines: Vec<String> = policy
        .schedule()
        .take(PREVIEW_LIMIT as usize)
        .enumerate()
        .map(|(i, d)| format!("retry {}: {}s", i + 1, d.as_secs()))
        .collect();
    if policy.max_retry > PREVIEW_LIMIT {
        lines.push(format!(
            "... {} more retries not shown",
            policy.max_retry - PREVIEW_LIMIT
        ));
    }
    lines.push(format!(
        "{} backoff, multiplier {}, {} retries: {}s total",
        policy.mode,
        policy.multiplier,
        policy.max_retry,
        policy.total_delay_secs()
    ));
    lines
}

pub fn run_schedule(policy: &RetryPolicy) -> Result<()> {
    policy.validate().context("invalid retry policy")?;
    for line in schedule_lines(policy) {
        println!("{}", line);
    }
    Ok(())
}
