//! credtree - Main Entry Point
//!
//! Usage:
//!     credtree headers export.csv
//!     credtree tree export.csv --fields title,password
//!     credtree compare old.csv new.csv --json

use std::process::ExitCode;

use clap::Parser;
use credtree_cli::logging::{filter_for_level, init_with_filter};
use credtree_cli::{run, Cli, Config};
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_with_filter(filter_for_level(level));
    debug!("credtree {}", env!("CARGO_PKG_VERSION"));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match run(&cli.command, &config, &mut out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
