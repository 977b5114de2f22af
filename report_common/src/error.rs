//! Error types shared between the report library and the client binary.
//!
//! The `ReportError` enum unifies the failure cases of a report run (configuration,
//! quote retrieval, OAuth, mail submission) so every crate can propagate a single
//! error type.
use std::io;

use thiserror::Error;

/// Unified error type shared by the library and the client.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Missing or malformed `config.json`. Fatal before any network activity.
    #[error("Config error: {0}")]
    Config(String),

    /// Transport failure or non-2xx status from the quote API.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Quote response did not contain the expected fields.
    #[error("Parse error: {0}")]
    Parse(String),

    /// OAuth token could not be loaded, refreshed or obtained via consent.
    #[error("Auth error: {0}")]
    Auth(String),

    /// The mail provider rejected the message.
    #[error("Send error: {0}")]
    Send(String),

    /// I/O error originating from the standard library or sockets/files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
