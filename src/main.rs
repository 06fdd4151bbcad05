use std::process::ExitCode;

use clap::Parser;

use ophtha_core::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    ophtha_core::init_tracing();

    match cli::run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
