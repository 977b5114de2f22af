//! Report Client — fetches quotes for the configured tickers and a benchmark index,
//! selects the tickers whose percent change deviates from the benchmark by more than the
//! configured threshold, and mails an HTML summary through the Gmail API.
//!
//! Usage example (CLI):
//! ```bash
//! report_client /opt/stock-report
//! ```
//!
//! The base directory (default: the current directory) holds `config.json`,
//! `credentials.json` and, after the first consent, `token.json`. The process always exits
//! with status 0, including on invalid arguments; failures are reported on stdout through the logger.
#![warn(missing_docs)]
mod args;
mod auth;
mod fetcher;
mod model;
mod orchestrator;
mod sender;
#[cfg(test)]
mod testutil;

use crate::args::Args;
use crate::orchestrator::collect_fin_data;
use log::{error, info};

fn main() {
    init_logger();
    let Some(args) = Args::from_argv(std::env::args_os()) else {
        return;
    };
    let base_path = args.base_dir();

    match collect_fin_data(&base_path) {
        Ok(summary) => info!(
            "Fetched {:?}, skipped {:?}, reported {:?}",
            summary.fetched, summary.skipped, summary.reported
        ),
        Err(e) => error!("{}", e),
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Stdout)
        .parse_default_env()
        .init();
}
