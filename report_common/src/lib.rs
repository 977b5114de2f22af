//!
//! Common types and pure logic of the daily stock report.
//!
//! This crate aggregates:
//! - `error` — unified error type `ReportError` used across the workspace.
//! - `result` — handy `Result<T, ReportError>` alias.
//! - `net` — endpoints, path templates, file names and the OAuth scope.
//! - `config` — `config.json` loading.
//! - `quote` — `Quote`/`ReportEntry` and option-chain parsing.
//! - `deviation` — benchmark deviation filter.
//! - `report` — HTML report rendering.
#![warn(missing_docs)]
pub mod config;
pub mod deviation;
pub mod error;
pub mod net;
pub mod quote;
pub mod report;
pub mod result;

pub use config::Config;
pub use error::ReportError;
pub use quote::{Quote, ReportEntry};
pub use result::Result;
