//! Main application entry point.

use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting RackPlan");

    match rackplan_app::run(rackplan_app::Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("rackplan: {e}");
            ExitCode::FAILURE
        }
    }
}
