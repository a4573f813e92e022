//! CLI command handlers. Each command is in its own file.

mod completions;
mod man;
mod run;
mod schedule;

pub use completions::run_completions;
pub use man::run_man;
pub use run::run_retry;
pub use schedule::run_schedule;
