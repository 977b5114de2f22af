//! OAuth token and client secret files.
//!
//! `token.json` uses the authorized-user layout written by Google's client libraries, so a
//! token produced by other tooling can be reused as-is. `credentials.json` is the client
//! secret downloaded from the provider console (`installed` or `web` application).
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use report_common::ReportError;
use serde::{Deserialize, Serialize};

/// A token is treated as expired this long before its recorded expiry.
const EXPIRY_SKEW_SECS: i64 = 10;

/// Cached user-delegated credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    /// Access token presented as a bearer credential.
    pub token: String,
    /// Long-lived token used to mint new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token endpoint used for refreshes.
    pub token_uri: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Scopes granted to the token.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access token expiry (UTC). Absent means the token does not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl OAuthToken {
    /// Read a token file.
    pub fn read(path: &Path) -> Result<Self, ReportError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Overwrite the token file with this token.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        fs::write(path, serde_json::to_vec(self)?)?;
        Ok(())
    }

    /// Build a token from a token-endpoint response to a code exchange.
    pub fn from_response(
        secret: &ClientSecret,
        response: TokenResponse,
        scopes: &[&str],
        now: DateTime<Utc>,
    ) -> Self {
        let mut token = OAuthToken {
            token: String::new(),
            refresh_token: None,
            token_uri: secret.token_uri.clone(),
            client_id: secret.client_id.clone(),
            client_secret: secret.client_secret.clone(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            expiry: None,
        };
        token.apply(response, now);
        token
    }

    /// Replace the access token and expiry with a fresh response.
    ///
    /// The refresh token is only replaced when the response carries a new one.
    pub fn apply(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.token = response.access_token;
        self.expiry = response
            .expires_in
            .map(|secs| now + Duration::seconds(secs));
        if response.refresh_token.is_some() {
            self.refresh_token = response.refresh_token;
        }
        if let Some(scope) = response.scope {
            self.scopes = scope.split_whitespace().map(String::from).collect();
        }
    }

    /// `true` when the access token is empty or at/after its expiry (minus skew).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_empty() {
            return true;
        }
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }

    /// `true` when every scope in `required` was granted.
    pub fn has_scopes(&self, required: &[&str]) -> bool {
        required
            .iter()
            .all(|scope| self.scopes.iter().any(|granted| granted == scope))
    }

    /// Refresh token, if present and non-empty.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Successful token-endpoint response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    /// New access token.
    pub access_token: String,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// New refresh token (code exchange, occasionally refresh).
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Space-separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
}

/// OAuth client registration read from `credentials.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecret {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Authorization endpoint of the consent screen.
    pub auth_uri: String,
    /// Token endpoint for code exchange and refresh.
    pub token_uri: String,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Read a client secret file; either the `installed` or the `web` section is used.
    pub fn read(path: &Path) -> Result<Self, ReportError> {
        let file = File::open(path)
            .map_err(|e| ReportError::Auth(format!("{}: {}", path.display(), e)))?;
        let parsed: ClientSecretFile = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ReportError::Auth(format!("{}: {}", path.display(), e)))?;
        parsed.installed.or(parsed.web).ok_or_else(|| {
            ReportError::Auth(format!(
                "{}: expected an \"installed\" or \"web\" client",
                path.display()
            ))
        })
    }
}
