//! Command-line arguments for the report client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use clap::error::ErrorKind;
use log::error;
use std::ffi::OsString;
use std::path::PathBuf;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory containing config.json, credentials.json and token.json.
    /// Defaults to the current working directory.
    pub base_path: Option<String>,
}

impl Args {
    /// Parse `argv` without ever terminating the process.
    ///
    /// `--help`/`--version` are printed to stdout; usage errors are logged. Both yield
    /// `None` so the caller can return with status 0.
    pub fn from_argv<I, T>(argv: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Args::try_parse_from(argv) {
            Ok(args) => Some(args),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                if let Err(io_err) = e.print() {
                    error!("Failed to print usage: {}", io_err);
                }
                None
            }
            Err(e) => {
                error!("Invalid arguments: {}", e.render());
                None
            }
        }
    }

    /// Resolved base directory. An absent argument maps to the empty (relative) path.
    pub fn base_dir(&self) -> PathBuf {
        self.base_path
            .as_deref()
            .map(normalize_path)
            .unwrap_or_default()
    }
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}
