//! Report email message.
//!
//! A `multipart/alternative` MIME message with a single HTML part. The provider's send
//! endpoint takes the full RFC 822 text encoded as padded base64url (`raw`).
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use report_common::net::REPORT_SUBJECT;
use serde::Serialize;

/// Email built for one run; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    /// `From` header.
    pub sender: String,
    /// `To` header.
    pub recipient: String,
    /// `Subject` header.
    pub subject: String,
    /// HTML body.
    pub html: String,
    boundary: String,
}

/// JSON body of the send request.
#[derive(Debug, Serialize)]
pub struct RawMessage {
    /// base64url-encoded RFC 822 message.
    pub raw: String,
}

impl EmailMessage {
    /// Create the daily report message with a random MIME boundary.
    pub fn report(sender: &str, recipient: &str, html: &str) -> Self {
        let boundary = format!("==============={:020}==", rand::random::<u64>());
        Self::with_boundary(sender, recipient, html, boundary)
    }

    /// Create the daily report message with a fixed boundary.
    pub fn with_boundary(sender: &str, recipient: &str, html: &str, boundary: String) -> Self {
        EmailMessage {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            subject: REPORT_SUBJECT.to_string(),
            html: html.to_string(),
            boundary,
        }
    }

    /// Full message text with CRLF line endings.
    pub fn to_mime(&self) -> String {
        let b = &self.boundary;
        [
            format!("Content-Type: multipart/alternative; boundary=\"{b}\""),
            "MIME-Version: 1.0".to_string(),
            format!("Subject: {}", self.subject),
            format!("From: {}", self.sender),
            format!("To: {}", self.recipient),
            String::new(),
            format!("--{b}"),
            "Content-Type: text/html; charset=\"utf-8\"".to_string(),
            "MIME-Version: 1.0".to_string(),
            "Content-Transfer-Encoding: 8bit".to_string(),
            String::new(),
            self.html.clone(),
            format!("--{b}--"),
            String::new(),
        ]
        .join("\r\n")
    }

    /// Encode the message for the send endpoint.
    pub fn to_raw(&self) -> RawMessage {
        RawMessage {
            raw: URL_SAFE.encode(self.to_mime().as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage::with_boundary(
            "me@example.com",
            "you@example.com",
            "<html><body>hi</body></html>",
            "BOUNDARY".into(),
        )
    }

    #[test]
    fn headers_and_html_part() {
        let mime = message().to_mime();
        assert!(mime.starts_with("Content-Type: multipart/alternative; boundary=\"BOUNDARY\"\r\n"));
        assert!(mime.contains("\r\nSubject: Daily Stock Report\r\n"));
        assert!(mime.contains("\r\nFrom: me@example.com\r\n"));
        assert!(mime.contains("\r\nTo: you@example.com\r\n"));
        assert!(mime.contains("\r\n--BOUNDARY\r\nContent-Type: text/html; charset=\"utf-8\"\r\n"));
        assert!(mime.contains("\r\n\r\n<html><body>hi</body></html>\r\n--BOUNDARY--\r\n"));
    }

    #[test]
    fn raw_is_url_safe_base64_of_mime() {
        let msg = message();
        let raw = msg.to_raw().raw;
        assert!(!raw.contains('+') && !raw.contains('/'));
        let decoded = URL_SAFE.decode(raw).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), msg.to_mime());
    }

    #[test]
    fn random_boundaries_differ() {
        let a = EmailMessage::report("a", "b", "");
        let b = EmailMessage::report("a", "b", "");
        assert_ne!(a.boundary, b.boundary);
    }
}
