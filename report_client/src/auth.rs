//! OAuth2 authentication for the mail provider.
//!
//! The cached `token.json` is classified into a `CredentialState` and resolved to a usable
//! token:
//!
//! - `Valid` — used directly, no network call, file untouched.
//! - `Refreshable` — expired but carries a refresh token; refreshed at the token endpoint.
//! - `NoToken`, `Unrefreshable`, `Invalid` — the interactive consent flow runs.
//!
//! Whenever a new token is obtained it is written back to `token.json`. The file is not
//! locked; concurrent runs against the same base path race on it.
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use report_common::ReportError;
use report_common::net::{CREDENTIALS_FILE, TOKEN_FILE};
use reqwest::blocking::Client;
use strum_macros::Display;

use crate::model::token::{ClientSecret, OAuthToken, TokenResponse};

/// Page shown in the browser once the redirect was received.
const CONSENT_DONE_PAGE: &str =
    "The authentication flow has completed. You may close this window.";

/// Validity of the cached credential.
#[derive(Debug, Display)]
pub enum CredentialState {
    /// No token file.
    NoToken,
    /// Token can be used as-is.
    Valid(OAuthToken),
    /// Token expired, refresh token present.
    Refreshable(OAuthToken),
    /// Token expired, no refresh token.
    Unrefreshable(OAuthToken),
    /// Token file unreadable or granted for other scopes.
    Invalid(String),
}

/// Token endpoint operations.
pub trait TokenEndpoint {
    /// Mint a new access token from `token`'s refresh token.
    fn refresh(&self, token: &OAuthToken) -> Result<TokenResponse, ReportError>;

    /// Exchange an authorization `code` obtained via consent.
    fn exchange_code(
        &self,
        secret: &ClientSecret,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, ReportError>;
}

/// Interactive user consent producing a fresh token.
pub trait ConsentFlow {
    /// Run the consent flow using the client secret at `credentials_path`.
    fn authorize(&self, credentials_path: &Path, scopes: &[&str]) -> Result<OAuthToken, ReportError>;
}

/// Classify the token file at `token_path` against `scopes` at time `now`.
pub fn classify(token_path: &Path, scopes: &[&str], now: DateTime<Utc>) -> CredentialState {
    if !token_path.exists() {
        return CredentialState::NoToken;
    }
    let token = match OAuthToken::read(token_path) {
        Ok(token) => token,
        Err(e) => return CredentialState::Invalid(e.to_string()),
    };
    if !token.has_scopes(scopes) {
        return CredentialState::Invalid(format!(
            "token grants {:?}, need {:?}",
            token.scopes, scopes
        ));
    }
    if !token.is_expired(now) {
        CredentialState::Valid(token)
    } else if token.refresh_token().is_some() {
        CredentialState::Refreshable(token)
    } else {
        CredentialState::Unrefreshable(token)
    }
}

/// Resolve a usable token for `scopes` from the files under `base_path`.
pub fn authenticate(
    base_path: &Path,
    scopes: &[&str],
    endpoint: &impl TokenEndpoint,
    consent: &impl ConsentFlow,
) -> Result<OAuthToken, ReportError> {
    let token_path = base_path.join(TOKEN_FILE);
    let state = classify(&token_path, scopes, Utc::now());
    info!("Credential state: {}", state);

    let token = match state {
        CredentialState::Valid(token) => return Ok(token),
        CredentialState::Refreshable(mut token) => {
            let response = endpoint.refresh(&token)?;
            token.apply(response, Utc::now());
            info!("Access token refreshed");
            token
        }
        CredentialState::Invalid(reason) => {
            warn!("Ignoring cached token: {}", reason);
            consent.authorize(&base_path.join(CREDENTIALS_FILE), scopes)?
        }
        CredentialState::NoToken | CredentialState::Unrefreshable(_) => {
            consent.authorize(&base_path.join(CREDENTIALS_FILE), scopes)?
        }
    };

    token.save(&token_path)?;
    debug!("Token saved to {}", token_path.display());
    Ok(token)
}

/// `TokenEndpoint` talking to the provider over HTTPS.
pub struct GoogleTokenEndpoint {
    client: Client,
}

impl GoogleTokenEndpoint {
    /// Create an endpoint using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn post(&self, token_uri: &str, form: &[(&str, &str)]) -> Result<TokenResponse, ReportError> {
        let response = self
            .client
            .post(token_uri)
            .form(form)
            .send()
            .map_err(|e| ReportError::Auth(format!("token request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ReportError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }
        response
            .json::<TokenResponse>()
            .map_err(|e| ReportError::Auth(format!("invalid token response: {}", e)))
    }
}

impl TokenEndpoint for GoogleTokenEndpoint {
    fn refresh(&self, token: &OAuthToken) -> Result<TokenResponse, ReportError> {
        let refresh_token = token
            .refresh_token()
            .ok_or_else(|| ReportError::Auth("no refresh token".to_string()))?;
        self.post(
            &token.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", token.client_id.as_str()),
                ("client_secret", token.client_secret.as_str()),
                ("refresh_token", refresh_token),
            ],
        )
    }

    fn exchange_code(
        &self,
        secret: &ClientSecret,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, ReportError> {
        self.post(
            &secret.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("client_id", secret.client_id.as_str()),
                ("client_secret", secret.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ],
        )
    }
}

/// Installed-app consent: the user opens the printed URL and the provider redirects the
/// browser to a loopback listener.
pub struct LocalServerConsent<'a, E: TokenEndpoint> {
    endpoint: &'a E,
    interactive: bool,
}

impl<'a, E: TokenEndpoint> LocalServerConsent<'a, E> {
    /// Create a consent flow exchanging codes at `endpoint`.
    pub fn new(endpoint: &'a E) -> Self {
        Self {
            endpoint,
            interactive: io::stdout().is_terminal(),
        }
    }
}

impl<E: TokenEndpoint> ConsentFlow for LocalServerConsent<'_, E> {
    fn authorize(&self, credentials_path: &Path, scopes: &[&str]) -> Result<OAuthToken, ReportError> {
        if !self.interactive {
            return Err(ReportError::Auth(
                "consent required but no interactive terminal is attached".to_string(),
            ));
        }
        let secret = ClientSecret::read(credentials_path)?;

        let listener = TcpListener::bind("127.0.0.1:0")?;
        let redirect_uri = format!("http://localhost:{}/", listener.local_addr()?.port());
        let state = format!("{:016x}", rand::random::<u64>());

        println!(
            "Please visit this URL to authorize this application: {}",
            authorization_url(&secret, &redirect_uri, scopes, &state)
        );

        let code = wait_for_code(&listener, &state)?;
        let response = self.endpoint.exchange_code(&secret, &code, &redirect_uri)?;
        info!("Consent granted");
        Ok(OAuthToken::from_response(&secret, response, scopes, Utc::now()))
    }
}

/// Build the consent screen URL.
pub fn authorization_url(
    secret: &ClientSecret,
    redirect_uri: &str,
    scopes: &[&str],
    state: &str,
) -> String {
    let scope = scopes.join(" ");
    let params = [
        ("response_type", "code"),
        ("client_id", secret.client_id.as_str()),
        ("redirect_uri", redirect_uri),
        ("scope", scope.as_str()),
        ("state", state),
        ("access_type", "offline"),
    ];
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
    format!("{}?{}", secret.auth_uri, query.join("&"))
}

/// Accept connections on `listener` until the browser redirect arrives and return the
/// authorization code.
///
/// Connections that carry neither `code` nor `error` (browser preconnects, favicon
/// requests, port probes) are answered and skipped.
fn wait_for_code(listener: &TcpListener, expected_state: &str) -> Result<String, ReportError> {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Consent listener accept error: {}", e);
                continue;
            }
        };
        let request_line = match read_request_line(&stream) {
            Ok(line) => line,
            Err(e) => {
                debug!("Dropping consent connection: {}", e);
                continue;
            }
        };
        if !is_redirect(&request_line) {
            debug!("Ignoring non-redirect request: {:?}", request_line.trim());
            if let Err(e) = reply(&stream, "404 Not Found", "") {
                debug!("Stray consent connection closed early: {}", e);
            }
            continue;
        }

        let result = parse_redirect(&request_line, expected_state);
        let page = match &result {
            Ok(_) => CONSENT_DONE_PAGE.to_string(),
            Err(e) => e.to_string(),
        };
        reply(&stream, "200 OK", &page)?;
        return result;
    }
    Err(ReportError::Auth("consent listener closed before the redirect".to_string()))
}

/// Read the request line and drain headers up to the blank line.
fn read_request_line(stream: &TcpStream) -> io::Result<String> {
    let peer = stream.peer_addr()?;
    debug!("Consent connection from {}", peer);

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut header = String::new();
    while reader.read_line(&mut header)? > 2 {
        header.clear();
    }
    Ok(request_line)
}

fn reply(mut stream: &TcpStream, status: &str, page: &str) -> io::Result<()> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        page.len(),
        page
    );
    stream.write_all(response.as_bytes())
}

/// `true` when the request line's query carries a `code` or an `error` parameter.
fn is_redirect(request_line: &str) -> bool {
    request_line
        .split_whitespace()
        .nth(1)
        .and_then(|target| target.split_once('?'))
        .map(|(_, query)| {
            query.split('&').any(|pair| {
                let key = pair.split_once('=').map(|(k, _)| k).unwrap_or(pair);
                key == "code" || key == "error"
            })
        })
        .unwrap_or(false)
}

/// Extract the `code` from a redirect request line such as
/// `GET /?state=..&code=..&scope=.. HTTP/1.1`.
fn parse_redirect(request_line: &str, expected_state: &str) -> Result<String, ReportError> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ReportError::Auth(format!("malformed redirect: {:?}", request_line.trim())))?;
    let query = target.split_once('?').map(|(_, q)| q).unwrap_or("");

    let mut code = None;
    let mut state = None;
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(value)
            .map_err(|e| ReportError::Auth(format!("malformed redirect parameter: {}", e)))?
            .into_owned();
        match key {
            "code" => code = Some(value),
            "state" => state = Some(value),
            "error" => return Err(ReportError::Auth(format!("consent denied: {}", value))),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Err(ReportError::Auth("state mismatch in consent redirect".to_string()));
    }
    code.ok_or_else(|| ReportError::Auth("consent redirect carried no code".to_string()))
}
