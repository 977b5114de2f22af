//! Fetching quotes from the option-chain API.
//!
//! One blocking GET per symbol, no retries and no timeout override. The `QuoteSource`
//! trait is the seam the orchestrator depends on, so a run can be driven without a network.
use log::debug;
use report_common::net::quote_url;
use report_common::{Quote, ReportError};
use reqwest::blocking::Client;

/// Anything that can produce a `Quote` for a symbol.
pub trait QuoteSource {
    /// Fetch the current quote of `symbol`.
    fn fetch_quote(&self, symbol: &str) -> Result<Quote, ReportError>;
}

/// `QuoteSource` backed by the HTTP quote API.
pub struct HttpQuoteClient {
    endpoint: String,
    client: Client,
}

impl HttpQuoteClient {
    /// Create a client for the API rooted at `endpoint`.
    pub fn new(endpoint: &str) -> Result<Self, ReportError> {
        let client = Client::builder()
            .user_agent(concat!("stock_report/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReportError::Http(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }
}

impl QuoteSource for HttpQuoteClient {
    fn fetch_quote(&self, symbol: &str) -> Result<Quote, ReportError> {
        let url = quote_url(&self.endpoint, symbol);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ReportError::Http(format!("{}: request failed: {}", symbol, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Http(format!(
                "{}: status {}",
                symbol,
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .map_err(|e| ReportError::Http(format!("{}: failed to read body: {}", symbol, e)))?;
        Quote::from_option_chain(symbol, &body)
    }
}
