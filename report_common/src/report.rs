//! HTML report rendering.
//!
//! The document is a fixed skeleton: an intro paragraph followed by one block per entry.
//! Values are interpolated verbatim, without escaping, rounding or locale formatting.
//! Numbers use `{:?}` so whole values keep their fractional part (`150.0`, not `150`).
use crate::quote::ReportEntry;

/// Intro paragraph shown above the entries.
pub const INTRO: &str = "See below for the day's interesting stocks report.";

/// Render `entries` into the report body. An empty slice yields the intro only.
pub fn render(entries: &[ReportEntry]) -> String {
    let mut html = format!("<html><body><div><p>{}</p><br>", INTRO);
    for entry in entries {
        html.push_str(&render_entry(entry));
    }
    html.push_str("</div></body></html>");
    html
}

fn render_entry(entry: &ReportEntry) -> String {
    format!(
        "<div><p>Symbol: {}</p><p>Stock Price: ${:?}</p><p>% Change: {:?}</p><br></div>",
        entry.symbol, entry.price, entry.percent_change
    )
}
