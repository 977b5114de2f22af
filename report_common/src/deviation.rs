//! Deviation filter: selects tickers that moved differently from the benchmark.
use crate::quote::{Quote, ReportEntry};

/// Absolute difference between a quote's percent change and the benchmark's.
pub fn deviation(benchmark: &Quote, quote: &Quote) -> f64 {
    (quote.percent_change - benchmark.percent_change).abs()
}

/// Select the quotes whose deviation from `benchmark` is strictly greater than
/// `threshold`.
///
/// Input order is preserved; a deviation equal to the threshold is not selected.
pub fn select_outliers(benchmark: &Quote, quotes: &[Quote], threshold: f64) -> Vec<ReportEntry> {
    quotes
        .iter()
        .filter(|quote| deviation(benchmark, quote) > threshold)
        .map(ReportEntry::from)
        .collect()
}
