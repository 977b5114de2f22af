//! Fixed endpoints, path templates and file names used by the client.

/// Config file name, relative to the base path.
pub const CONFIG_FILE: &str = "config.json";
/// OAuth client secret file name, relative to the base path.
pub const CREDENTIALS_FILE: &str = "credentials.json";
/// Cached OAuth token file name, relative to the base path.
pub const TOKEN_FILE: &str = "token.json";

/// Send-only mail scope requested during consent.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/gmail.send"];

/// Path of the option-chain quote resource; the symbol is appended.
pub const OPTIONS_PATH: &str = "/v7/finance/options/";

/// Base of the mail provider REST API.
pub const GMAIL_API: &str = "https://gmail.googleapis.com/gmail/v1";

/// Subject line of every report.
pub const REPORT_SUBJECT: &str = "Daily Stock Report";

/// Build the quote URL for `symbol` under `endpoint`.
///
/// A trailing `/` on the endpoint is dropped so the path is not doubled. The symbol is
/// percent-encoded, which matters for index symbols such as `^GSPC`.
pub fn quote_url(endpoint: &str, symbol: &str) -> String {
    format!(
        "{}{}{}",
        endpoint.trim_end_matches('/'),
        OPTIONS_PATH,
        urlencoding::encode(symbol)
    )
}

/// Build the send URL for the mailbox of `user_id` under `api_base` (normally `GMAIL_API`).
pub fn send_url(api_base: &str, user_id: &str) -> String {
    format!(
        "{}/users/{}/messages/send",
        api_base.trim_end_matches('/'),
        urlencoding::encode(user_id)
    )
}
