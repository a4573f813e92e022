use again_core::logging;

mod cli;

use crate::cli::{CliCommand, CommandError};

#[tokio::main]
async fn main() {
    // Fall back to stderr if the XDG state dir is unusable.
    let logs_on_stderr = match logging::init_logging() {
        Ok(()) => false,
        Err(_) => {
            logging::init_logging_stderr();
            true
        }
    };

    if let Err(err) = CliCommand::run_from_args(logs_on_stderr).await {
        eprintln!("again error: {:#}", err);
        let code = err
            .downcast_ref::<CommandError>()
            .map(CommandError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
