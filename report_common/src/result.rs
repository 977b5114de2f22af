//! Result type alias shared across the workspace.
//!
//! Defaults the error type to `ReportError`, so functions can simply return `Result<T>`.
use crate::error::ReportError;

/// Workspace-wide `Result` alias with `ReportError` as the default error.
pub type Result<T, E = ReportError> = std::result::Result<T, E>;
