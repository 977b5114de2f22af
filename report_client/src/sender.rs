//! Sending the report through the mail provider API.
//!
//! `GmailDispatcher` authenticates (see `auth`), builds the MIME message and submits it
//! to the provider's send endpoint on behalf of the sender mailbox.
use std::path::{Path, PathBuf};

use log::{debug, info};
use report_common::ReportError;
use report_common::net::{GMAIL_API, SCOPES, send_url};
use reqwest::blocking::Client;

use crate::auth::{GoogleTokenEndpoint, LocalServerConsent, authenticate};
use crate::model::message::EmailMessage;

/// Anything that can deliver a rendered report.
pub trait ReportMailer {
    /// Deliver `html` from `sender` to `recipient`.
    fn send_report(&self, sender: &str, recipient: &str, html: &str) -> Result<(), ReportError>;
}

/// `ReportMailer` backed by the Gmail REST API.
pub struct GmailDispatcher {
    base_path: PathBuf,
    api_base: String,
    client: Client,
    token_endpoint: GoogleTokenEndpoint,
}

impl GmailDispatcher {
    /// Create a dispatcher reading `credentials.json` and `token.json` from `base_path`.
    pub fn new(base_path: &Path) -> Result<Self, ReportError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ReportError::Send(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_path: base_path.to_path_buf(),
            api_base: GMAIL_API.to_string(),
            token_endpoint: GoogleTokenEndpoint::new(client.clone()),
            client,
        })
    }

    /// Submit `message` as `user_id` using `access_token`.
    pub fn submit(
        &self,
        access_token: &str,
        user_id: &str,
        message: &EmailMessage,
    ) -> Result<(), ReportError> {
        let url = send_url(&self.api_base, user_id);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&message.to_raw())
            .send()
            .map_err(|e| ReportError::Send(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ReportError::Send(format!(
                "provider returned {}: {}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }
}

impl ReportMailer for GmailDispatcher {
    fn send_report(&self, sender: &str, recipient: &str, html: &str) -> Result<(), ReportError> {
        let consent = LocalServerConsent::new(&self.token_endpoint);
        let token = authenticate(&self.base_path, SCOPES, &self.token_endpoint, &consent)?;

        let message = EmailMessage::report(sender, recipient, html);
        self.submit(&token.token, sender, &message)?;
        info!("Report sent from {} to {}", sender, recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::serve_once;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE;

    fn dispatcher(api_base: String) -> GmailDispatcher {
        let mut dispatcher = GmailDispatcher::new(Path::new("")).unwrap();
        dispatcher.api_base = api_base;
        dispatcher
    }

    #[test]
    fn submit_posts_raw_message_with_bearer_token() {
        let (base, server) = serve_once("200 OK", r#"{"id":"18c","threadId":"18c","labelIds":["SENT"]}"#);
        let message = EmailMessage::with_boundary("me@example.com", "you@example.com", "<p>x</p>", "B".into());

        dispatcher(base)
            .submit("ya29.token", "me@example.com", &message)
            .unwrap();

        let request = server.join().unwrap();
        assert!(request.head.starts_with("POST /users/me%40example.com/messages/send HTTP/1.1"));
        assert!(request.head.to_ascii_lowercase().contains("authorization: bearer ya29.token"));

        let json: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        let raw = URL_SAFE.decode(json["raw"].as_str().unwrap()).unwrap();
        assert_eq!(String::from_utf8(raw).unwrap(), message.to_mime());
    }

    #[test]
    fn rejected_message_is_send_error() {
        let (base, server) = serve_once("403 Forbidden", r#"{"error":{"code":403,"message":"Delegation denied"}}"#);
        let message = EmailMessage::report("me@example.com", "you@example.com", "");

        let err = dispatcher(base)
            .submit("ya29.token", "me@example.com", &message)
            .unwrap_err();

        assert!(matches!(err, ReportError::Send(ref msg) if msg.contains("403") && msg.contains("Delegation denied")));
        server.join().unwrap();
    }
}
