//! Quote data model and option-chain response parsing.
//!
//! A `Quote` is built from the body of an option-chain response; a `ReportEntry` is the
//! subset of a quote that ends up in the rendered report.
use serde_json::Value;

use crate::error::ReportError;
use crate::result::Result;

/// JSON pointer of the quote object inside an option-chain response.
const QUOTE_POINTER: &str = "/optionChain/result/0/quote";

/// Market quote for a single symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    /// Symbol as requested.
    pub symbol: String,
    /// Regular market price.
    pub price: f64,
    /// Regular market change, in percent.
    pub percent_change: f64,
}

impl Quote {
    /// Create a new quote.
    pub fn new(symbol: impl Into<String>, price: f64, percent_change: f64) -> Self {
        Quote {
            symbol: symbol.into(),
            price,
            percent_change,
        }
    }

    /// Parse an option-chain response body for `symbol`.
    ///
    /// Reads `optionChain.result[0].quote.{regularMarketPrice, regularMarketChangePercent}`.
    /// A body that is not JSON, or lacks either field, is a `ReportError::Parse`.
    pub fn from_option_chain(symbol: &str, body: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(body)
            .map_err(|e| ReportError::Parse(format!("{}: invalid JSON: {}", symbol, e)))?;
        let quote = root.pointer(QUOTE_POINTER).ok_or_else(|| {
            ReportError::Parse(format!("{}: missing optionChain.result[0].quote", symbol))
        })?;

        let field = |name: &str| {
            quote.get(name).and_then(Value::as_f64).ok_or_else(|| {
                ReportError::Parse(format!("{}: missing numeric field {}", symbol, name))
            })
        };

        Ok(Quote::new(
            symbol,
            field("regularMarketPrice")?,
            field("regularMarketChangePercent")?,
        ))
    }
}

/// A quote selected for the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    /// Ticker symbol.
    pub symbol: String,
    /// Price at the time of the fetch.
    pub price: f64,
    /// Percent change, printed as-is.
    pub percent_change: f64,
}

impl From<&Quote> for ReportEntry {
    fn from(quote: &Quote) -> Self {
        ReportEntry {
            symbol: quote.symbol.clone(),
            price: quote.price,
            percent_change: quote.percent_change,
        }
    }
}
