use std::process::ExitCode;

use clap::Parser;
use sentiment_service::cli::{dispatch, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
