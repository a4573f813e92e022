//! Retry loop: run a closure until it succeeds, the budget runs out, or a
//! classified error ends it early.

use std::fmt;

use super::classify::{Classify, ErrorClass};
use super::error::{ConfigError, RetryError};
use super::policy::RetryPolicy;
use super::wait::{apply_delay, RetrySink, Sleeper, ThreadSleeper, TracingSink, WaitNotice};

/// How a retry loop ended without propagating an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The unit of work succeeded. `T` is `()` when it yields no value.
    Completed(T),
    /// A `continue_on` error ended the loop; no value was produced.
    Skipped { reason: String },
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(v) => Some(v),
            Outcome::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped { .. })
    }
}

/// Validated retry loop. Each `execute` call carries its own attempt counter.
#[derive(Debug)]
pub struct Executor<S = TracingSink, Z = ThreadSleeper> {
    policy: RetryPolicy,
    sink: S,
    sleeper: Z,
}

impl Executor {
    /// Fails fast on an invalid policy; no attempt is made.
    pub fn new(policy: RetryPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self {
            policy,
            sink: TracingSink,
            sleeper: ThreadSleeper,
        })
    }
}

impl<S: RetrySink, Z: Sleeper> Executor<S, Z> {
    pub fn with_sink<S2: RetrySink>(self, sink: S2) -> Executor<S2, Z> {
        Executor {
            policy: self.policy,
            sink,
            sleeper: self.sleeper,
        }
    }

    pub fn with_sleeper<Z2: Sleeper>(self, sleeper: Z2) -> Executor<S, Z2> {
        Executor {
            policy: self.policy,
            sink: self.sink,
            sleeper,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Loop decisions other than waits follow the policy's channel choice.
    fn note(&mut self, message: &str) {
        if self.policy.warning {
            self.sink.warn(message);
        } else {
            self.sink.verbose(message);
        }
    }

    /// Run `work` until it returns `Ok`, or until the policy says stop.
    ///
    /// Stop-listed and budget-exhausted failures come back as the original
    /// `Err(e)`. A continue-listed failure yields `Outcome::Skipped` after a
    /// single warning.
    pub fn execute<T, E, F>(&mut self, mut work: F) -> Result<Outcome<T>, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Classify + fmt::Display,
    {
        // u64 so a budget of u32::MAX retries still ends after max_retry + 1 attempts.
        let mut attempt = 0u64;
        loop {
            attempt += 1;
            let err = match work() {
                Ok(value) => {
                    if attempt > 1 {
                        self.note(&format!("succeeded on attempt {}", attempt));
                    }
                    return Ok(Outcome::Completed(value));
                }
                Err(e) => e,
            };

            let class = self.policy.lists.classify(&err.classification_key());
            match class {
                ErrorClass::Stop => {
                    self.note(&format!(
                        "attempt {} failed with stop-listed error, not retrying",
                        attempt
                    ));
                    return Err(err);
                }
                ErrorClass::Continue => {
                    let reason = err.to_string();
                    self.sink.warn(&format!(
                        "giving up without error after attempt {}: {}",
                        attempt, reason
                    ));
                    return Ok(Outcome::Skipped { reason });
                }
                ErrorClass::Transient => {}
            }

            if budget_exhausted(attempt, self.policy.max_retry) {
                self.note(&format!(
                    "retry budget of {} exhausted after {} attempts",
                    self.policy.max_retry, attempt
                ));
                return Err(err);
            }

            let prefix = match self.policy.message.as_deref() {
                Some(m) => format!("{} attempt failed: {}.", m, err),
                None => format!("attempt failed: {}.", err),
            };
            // Lossless: attempt <= max_retry here.
            let attempt = u32::try_from(attempt).unwrap_or(u32::MAX);
            let notice = WaitNotice {
                prefix: Some(&prefix),
                mode: self.policy.mode,
                attempt,
                delay: self.policy.delay_for(attempt),
            };
            apply_delay(&notice, true, &mut self.sink, &mut self.sleeper);
        }
    }
}

/// True once `attempt` (1-based) has used up the first try plus `max_retry` retries.
fn budget_exhausted(attempt: u64, max_retry: u32) -> bool {
    attempt > u64::from(max_retry)
}

/// Validate `policy`, then retry `work` with the default sink and real sleeps.
pub fn run_with_retry<T, E, F>(policy: &RetryPolicy, work: F) -> Result<Outcome<T>, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Classify + fmt::Display,
{
    Executor::new(policy.clone())?
        .execute(work)
        .map_err(RetryError::Failed)
}
