//! Run configuration loaded from `config.json`.
//!
//! The file is a JSON object with the keys `endpoint`, `s&p`, `tickers`, `threshold`,
//! `sender` and `recipient`. Every key is required; nothing else is validated.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::error::ReportError;
use crate::result::Result;

/// Parameters of a single report run. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Base URL of the quote API.
    pub endpoint: String,
    /// Market-index benchmark symbol.
    #[serde(rename = "s&p")]
    pub benchmark_symbol: String,
    /// Tickers to compare, in report order.
    pub tickers: Vec<String>,
    /// Deviation (in percentage points) a ticker must exceed to be reported.
    pub threshold: f64,
    /// Mailbox the report is sent from.
    pub sender: String,
    /// Mailbox the report is sent to.
    pub recipient: String,
}

impl Config {
    /// Load the config from `path`.
    ///
    /// Any failure (missing file, invalid JSON, missing key) is reported as
    /// `ReportError::Config` naming the file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| ReportError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ReportError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(
            "Loaded config: benchmark={} tickers={:?} threshold={}",
            config.benchmark_symbol, config.tickers, config.threshold
        );
        Ok(config)
    }
}
