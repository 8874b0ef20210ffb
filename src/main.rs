use std::process::ExitCode;

use clap::Parser;
use tcpclipboard_lib::bootstrap::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match bootstrap::resolve_settings(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = bootstrap::init_tracing_subscriber(settings.log_dir()) {
        eprintln!("failed to initialize logging: {err:#}");
    }

    match bootstrap::run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
