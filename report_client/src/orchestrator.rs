//! Report run sequencing.
//!
//! A run moves through `RunStage`s: config loaded, benchmark fetched, tickers fetched,
//! report generated, email sent. A benchmark failure aborts the run before any ticker is
//! requested; a ticker failure only drops that ticker (see `TickerFetch`). Any other error
//! ends the run as a `RunFailure` carrying the last stage reached.
use std::path::Path;

use log::{debug, info, warn};
use report_common::deviation::select_outliers;
use report_common::net::CONFIG_FILE;
use report_common::report::render;
use report_common::{Config, Quote, ReportError};
use strum_macros::Display;
use thiserror::Error;

use crate::fetcher::{HttpQuoteClient, QuoteSource};
use crate::sender::{GmailDispatcher, ReportMailer};

/// Progress of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RunStage {
    /// Nothing done yet.
    Start,
    /// `config.json` parsed.
    ConfigLoaded,
    /// Benchmark quote retrieved.
    BenchmarkFetched,
    /// All tickers attempted.
    TickersFetched,
    /// HTML body rendered.
    ReportGenerated,
    /// Mail accepted by the provider.
    EmailSent,
}

/// A run that stopped early.
#[derive(Debug, Error)]
#[error("report run failed after {stage}: {source}")]
pub struct RunFailure {
    /// Last stage reached before the failure.
    pub stage: RunStage,
    /// Underlying error.
    #[source]
    pub source: ReportError,
}

/// What a completed run fetched, skipped and reported.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    /// Tickers fetched successfully, in config order.
    pub fetched: Vec<String>,
    /// Tickers dropped because their fetch failed.
    pub skipped: Vec<String>,
    /// Tickers that made it into the report.
    pub reported: Vec<String>,
}

/// Outcome of fetching every configured ticker: successes and failures kept apart.
#[derive(Debug, Default)]
pub struct TickerFetch {
    /// Retrieved quotes, in request order.
    pub quotes: Vec<Quote>,
    /// Symbols that failed with their error.
    pub failures: Vec<(String, ReportError)>,
}

/// Fetch each ticker in order; failures are logged and collected, never propagated.
pub fn fetch_tickers(source: &impl QuoteSource, tickers: &[String]) -> TickerFetch {
    let mut fetch = TickerFetch::default();
    for symbol in tickers {
        match source.fetch_quote(symbol) {
            Ok(quote) => fetch.quotes.push(quote),
            Err(e) => {
                warn!("Skipping symbol {} due to API retrieval error: {}", symbol, e);
                fetch.failures.push((symbol.clone(), e));
            }
        }
    }
    fetch
}

struct Progress {
    stage: RunStage,
}

impl Progress {
    fn advance(&mut self, next: RunStage) {
        debug!("Run stage: {} -> {}", self.stage, next);
        self.stage = next;
    }

    fn fail(&self, source: ReportError) -> RunFailure {
        RunFailure {
            stage: self.stage,
            source,
        }
    }
}

/// Run a report for an already loaded `config`.
pub fn run_report(
    config: &Config,
    source: &impl QuoteSource,
    mailer: &impl ReportMailer,
) -> Result<RunSummary, RunFailure> {
    let mut progress = Progress {
        stage: RunStage::ConfigLoaded,
    };

    let benchmark = source
        .fetch_quote(&config.benchmark_symbol)
        .map_err(|e| progress.fail(e))?;
    info!(
        "Benchmark {}: {}%",
        benchmark.symbol, benchmark.percent_change
    );
    progress.advance(RunStage::BenchmarkFetched);

    let fetch = fetch_tickers(source, &config.tickers);
    progress.advance(RunStage::TickersFetched);

    let entries = select_outliers(&benchmark, &fetch.quotes, config.threshold);
    let html = render(&entries);
    progress.advance(RunStage::ReportGenerated);
    info!("Report generated. Sending via email...");

    mailer
        .send_report(&config.sender, &config.recipient, &html)
        .map_err(|e| progress.fail(e))?;
    progress.advance(RunStage::EmailSent);

    Ok(RunSummary {
        fetched: fetch.quotes.iter().map(|q| q.symbol.clone()).collect(),
        skipped: fetch.failures.into_iter().map(|(symbol, _)| symbol).collect(),
        reported: entries.into_iter().map(|e| e.symbol).collect(),
    })
}

/// Full run against the files under `base_path` and the live services.
pub fn collect_fin_data(base_path: &Path) -> Result<RunSummary, RunFailure> {
    info!("Beginning financial report creation...");
    let start = Progress {
        stage: RunStage::Start,
    };

    let config = Config::load(&base_path.join(CONFIG_FILE)).map_err(|e| start.fail(e))?;
    let loaded = Progress {
        stage: RunStage::ConfigLoaded,
    };
    let source = HttpQuoteClient::new(&config.endpoint).map_err(|e| loaded.fail(e))?;
    let mailer = GmailDispatcher::new(base_path).map_err(|e| loaded.fail(e))?;

    let summary = run_report(&config, &source, &mailer)?;
    info!("Report successfully sent!");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeSource {
        quotes: HashMap<&'static str, (f64, f64)>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn new(quotes: &[(&'static str, f64, f64)]) -> Self {
            Self {
                quotes: quotes.iter().map(|(s, p, c)| (*s, (*p, *c))).collect(),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl QuoteSource for FakeSource {
        fn fetch_quote(&self, symbol: &str) -> Result<Quote, ReportError> {
            self.requested.borrow_mut().push(symbol.to_string());
            self.quotes
                .get(symbol)
                .map(|(price, change)| Quote::new(symbol, *price, *change))
                .ok_or_else(|| ReportError::Http(format!("{}: status 404", symbol)))
        }
    }

    #[derive(Default)]
    struct FakeMailer {
        sent: RefCell<Vec<(String, String, String)>>,
        reject: bool,
    }

    impl ReportMailer for FakeMailer {
        fn send_report(&self, sender: &str, recipient: &str, html: &str) -> Result<(), ReportError> {
            if self.reject {
                return Err(ReportError::Send("provider returned 400".into()));
            }
            self.sent
                .borrow_mut()
                .push((sender.into(), recipient.into(), html.into()));
            Ok(())
        }
    }

    fn config(tickers: &[&str], threshold: f64) -> Config {
        Config {
            endpoint: "http://quotes.invalid".into(),
            benchmark_symbol: "^GSPC".into(),
            tickers: tickers.iter().map(|s| s.to_string()).collect(),
            threshold,
            sender: "me@example.com".into(),
            recipient: "you@example.com".into(),
        }
    }

    #[test]
    fn reports_outliers_in_config_order() {
        let source = FakeSource::new(&[
            ("^GSPC", 4500.0, 0.5),
            ("TSLA", 250.0, 4.0),
            ("MSFT", 410.0, 0.7),
            ("ABC", 100.5, -2.3),
        ]);
        let mailer = FakeMailer::default();

        let summary = run_report(&config(&["TSLA", "MSFT", "ABC"], 1.0), &source, &mailer).unwrap();

        assert_eq!(summary.fetched, vec!["TSLA", "MSFT", "ABC"]);
        assert!(summary.skipped.is_empty());
        assert_eq!(summary.reported, vec!["TSLA", "ABC"]);

        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        let (from, to, html) = &sent[0];
        assert_eq!(from, "me@example.com");
        assert_eq!(to, "you@example.com");
        assert!(html.contains("Symbol: ABC"));
        assert!(html.contains("Stock Price: $100.5"));
        assert!(html.contains("% Change: -2.3"));
        assert!(!html.contains("Symbol: MSFT"));
        assert!(html.find("Symbol: TSLA").unwrap() < html.find("Symbol: ABC").unwrap());
    }

    #[test]
    fn benchmark_failure_stops_before_tickers() {
        let source = FakeSource::new(&[("TSLA", 250.0, 4.0)]);
        let mailer = FakeMailer::default();

        let failure = run_report(&config(&["TSLA", "MSFT"], 1.0), &source, &mailer).unwrap_err();

        assert_eq!(failure.stage, RunStage::ConfigLoaded);
        assert!(matches!(failure.source, ReportError::Http(_)));
        assert_eq!(*source.requested.borrow(), vec!["^GSPC"]);
        assert!(mailer.sent.borrow().is_empty());
    }

    #[test]
    fn failed_ticker_is_skipped_and_absent_from_report() {
        let source = FakeSource::new(&[
            ("^GSPC", 4500.0, 0.0),
            ("AAA", 10.0, 5.0),
            ("CCC", 30.0, -5.0),
        ]);
        let mailer = FakeMailer::default();

        let summary = run_report(&config(&["AAA", "BBB", "CCC"], 1.0), &source, &mailer).unwrap();

        assert_eq!(summary.fetched, vec!["AAA", "CCC"]);
        assert_eq!(summary.skipped, vec!["BBB"]);
        assert_eq!(summary.reported, vec!["AAA", "CCC"]);
        assert!(!mailer.sent.borrow()[0].2.contains("BBB"));
    }

    #[test]
    fn fetch_tickers_keeps_failures_apart() {
        let source = FakeSource::new(&[("AAA", 1.0, 1.0)]);
        let fetch = fetch_tickers(&source, &["ZZZ".to_string(), "AAA".to_string()]);

        assert_eq!(fetch.quotes, vec![Quote::new("AAA", 1.0, 1.0)]);
        assert_eq!(fetch.failures.len(), 1);
        assert_eq!(fetch.failures[0].0, "ZZZ");
        assert_eq!(*source.requested.borrow(), vec!["ZZZ", "AAA"]);
    }

    #[test]
    fn no_outliers_still_sends_intro_only_report() {
        let source = FakeSource::new(&[("^GSPC", 4500.0, 0.2), ("AAA", 10.0, 0.3)]);
        let mailer = FakeMailer::default();

        let summary = run_report(&config(&["AAA"], 1.0), &source, &mailer).unwrap();

        assert!(summary.reported.is_empty());
        assert!(!mailer.sent.borrow()[0].2.contains("Symbol:"));
    }

    #[test]
    fn send_failure_reports_last_stage() {
        let source = FakeSource::new(&[("^GSPC", 4500.0, 0.2)]);
        let mailer = FakeMailer {
            reject: true,
            ..Default::default()
        };

        let failure = run_report(&config(&[], 1.0), &source, &mailer).unwrap_err();

        assert_eq!(failure.stage, RunStage::ReportGenerated);
        assert!(matches!(failure.source, ReportError::Send(_)));
        assert!(failure.to_string().contains("ReportGenerated"));
    }

    #[test]
    fn missing_config_fails_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let failure = collect_fin_data(dir.path()).unwrap_err();

        assert_eq!(failure.stage, RunStage::Start);
        assert!(matches!(failure.source, ReportError::Config(_)));
    }
}
