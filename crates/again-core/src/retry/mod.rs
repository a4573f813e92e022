//! Retry engine.
//!
//! Three pieces: the delay policy (fixed, linear or exponential backoff in
//! whole seconds), the wait step that announces and applies a delay, and the
//! executor loop that classifies each failure against the caller's stop and
//! continue lists before spending retry budget.

mod classify;
mod error;
mod policy;
mod run;
mod wait;

pub use classify::{Classify, ClassificationLists, ErrorClass};
pub use error::{ConfigError, ParseModeError, RetryError};
pub use policy::{compute_delay, BackoffMode, RetryPolicy, MIN_EXPONENTIAL_MULTIPLIER};
pub use run::{run_with_retry, Executor, Outcome};
pub use wait::{apply_delay, RetrySink, Sleeper, ThreadSleeper, TracingSink, WaitNotice};
