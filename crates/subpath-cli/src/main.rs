use subpath_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Log to the state dir when possible; an unwritable dir must not stop the CLI.
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable ({e:#}); logging to stderr");
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("subpath error: {:#}", err);
        std::process::exit(1);
    }
}
