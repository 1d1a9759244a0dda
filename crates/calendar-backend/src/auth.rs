//! OAuth 2.0 for installed applications.
//!
//! The flow mirrors what Google's client libraries do for desktop tools:
//!
//! 1. reuse the cached `token.json` while its access token is still valid;
//! 2. refresh it with the stored refresh token once it has expired;
//! 3. otherwise open a loopback listener on `127.0.0.1`, send the user to the consent
//!    page and exchange the returned authorization code.
//!
//! Whatever comes out of steps 2 and 3 is written back to the token file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::config::BackendConfig;
use crate::error::{BackendError, Result};

pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are treated as expired.
const EXPIRY_LEEWAY_SECS: i64 = 60;
const REDIRECT_TIMEOUT: Duration = Duration::from_secs(300);
const SUCCESS_PAGE: &str =
    "The authentication flow has completed. You may close this window.";

/// Anything that can hand out a bearer token for API calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// A fixed bearer token, for callers that obtained one elsewhere.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// OAuth client registration from the cloud console's `credentials.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse a secrets document; the `installed` section wins over `web`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SecretsFile = serde_json::from_str(json)?;
        file.installed.or(file.web).ok_or_else(|| {
            BackendError::Auth(
                "client secrets have neither an \"installed\" nor a \"web\" section".to_string(),
            )
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            BackendError::Auth(format!(
                "cannot read client secrets {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}

/// The authorized-user token cached on disk.
///
/// The client registration and token endpoint are stored alongside the token so the
/// file is self-contained, in the layout of Google's authorized-user credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// `None` means the provider did not say; such tokens are used until rejected.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl StoredToken {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        self.expiry
            .is_none_or(|expiry| expiry - chrono::Duration::seconds(EXPIRY_LEEWAY_SECS) > now)
    }

    /// True when every requested scope was granted. Tokens saved without scope
    /// information are assumed to match.
    pub fn covers(&self, scopes: &[String]) -> bool {
        self.scopes.is_empty() || scopes.iter().all(|s| self.scopes.contains(s))
    }
}

/// JSON file holding a [`StoredToken`].
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no token has been saved yet.
    pub fn load(&self) -> Result<Option<StoredToken>> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(token)?)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Produces access tokens, refreshing or re-authorizing as needed.
pub struct Authenticator {
    http: reqwest::Client,
    secrets: ClientSecrets,
    store: TokenStore,
    scopes: Vec<String>,
    cached: Mutex<Option<StoredToken>>,
}

impl Authenticator {
    pub fn new(secrets: ClientSecrets, store: TokenStore, scopes: Vec<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secrets,
            store,
            scopes,
            cached: Mutex::new(None),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let secrets = ClientSecrets::from_file(&config.credentials_path)?;
        Ok(Self::new(
            secrets,
            TokenStore::new(&config.token_path),
            config.scopes.clone(),
        ))
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Consent page URL for the given loopback redirect.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url> {
        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| BackendError::Config(format!("invalid auth_uri: {e}")))
    }

    /// Return a usable token: cached, refreshed, or freshly authorized.
    pub async fn authenticate(&self) -> Result<StoredToken> {
        let mut cached = self.cached.lock().await;
        if cached.is_none() {
            *cached = self.store.load()?;
        }

        let token = match cached.as_ref() {
            Some(token) if token.is_valid(Utc::now()) && token.covers(&self.scopes) => {
                return Ok(token.clone());
            }
            Some(token) if token.refresh_token.is_some() && token.covers(&self.scopes) => {
                debug!(path = %self.store.path().display(), "refreshing_expired_token");
                self.refresh(token).await?
            }
            _ => self.run_installed_flow().await?,
        };

        self.store.save(&token)?;
        info!(path = %self.store.path().display(), "token_saved");
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Trade the refresh token for a new access token.
    ///
    /// The refresh token is carried over when the response does not rotate it.
    pub async fn refresh(&self, token: &StoredToken) -> Result<StoredToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| BackendError::Auth("no refresh token available".to_string()))?;

        let mut form = vec![
            ("client_id", self.secrets.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = self.secrets.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self.request_token(&form).await?;
        self.to_stored(response, Some(refresh_token))
    }

    /// Exchange an authorization code received on `redirect_uri`.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<StoredToken> {
        let mut form = vec![
            ("client_id", self.secrets.client_id.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];
        if let Some(secret) = self.secrets.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self.request_token(&form).await?;
        self.to_stored(response, None)
    }

    /// Interactive consent through a one-shot loopback listener.
    pub async fn run_installed_flow(&self) -> Result<StoredToken> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{port}/");
        let state = uuid::Uuid::new_v4().simple().to_string();
        let url = self.authorization_url(&redirect_uri, &state)?;

        info!(port, "waiting_for_authorization_redirect");
        eprintln!("Please visit this URL to authorize this application: {url}");

        let code = tokio::time::timeout(REDIRECT_TIMEOUT, wait_for_redirect(&listener, &state))
            .await
            .map_err(|_| {
                BackendError::Auth("timed out waiting for the authorization redirect".to_string())
            })??;

        self.exchange_code(&code, &redirect_uri).await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.secrets.token_uri)
            .form(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    fn to_stored(
        &self,
        response: TokenResponse,
        previous_refresh: Option<&str>,
    ) -> Result<StoredToken> {
        let expiry = response
            .expires_in
            .map(|secs| {
                chrono::TimeDelta::try_seconds(secs)
                    .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
                    .ok_or_else(|| {
                        BackendError::Auth(format!("token lifetime out of range: {secs} s"))
                    })
            })
            .transpose()?;

        Ok(StoredToken {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expiry,
            scopes: response
                .scope
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_else(|| self.scopes.clone()),
            token_uri: Some(self.secrets.token_uri.clone()),
            client_id: Some(self.secrets.client_id.clone()),
            client_secret: self.secrets.client_secret.clone(),
        })
    }
}

#[async_trait]
impl TokenSource for Authenticator {
    async fn access_token(&self) -> Result<String> {
        Ok(self.authenticate().await?.access_token)
    }
}

/// Accept connections until one carries the authorization code.
///
/// Requests without a `code` (a browser asking for `/favicon.ico`) get a 404 and the
/// loop keeps waiting.
async fn wait_for_redirect(listener: &TcpListener, expected_state: &str) -> Result<String> {
    loop {
        let (mut stream, peer) = listener.accept().await?;
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        // Drain the headers so closing the socket does not reset the connection.
        let mut header = String::new();
        while reader.read_line(&mut header).await? > 0 && !header.trim_end().is_empty() {
            header.clear();
        }
        debug!(%peer, request = request_line.trim_end(), "redirect_request");

        match parse_redirect(&request_line, expected_state) {
            Ok(Some(code)) => {
                writer
                    .write_all(http_response("200 OK", SUCCESS_PAGE).as_bytes())
                    .await?;
                return Ok(code);
            }
            Ok(None) => {
                writer
                    .write_all(http_response("404 Not Found", "").as_bytes())
                    .await?;
            }
            Err(err) => {
                writer
                    .write_all(http_response("400 Bad Request", &err.to_string()).as_bytes())
                    .await?;
                return Err(err);
            }
        }
    }
}

/// Pull `code` out of a request line such as `GET /?state=..&code=.. HTTP/1.1`.
fn parse_redirect(request_line: &str, expected_state: &str) -> Result<Option<String>> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| BackendError::Auth("malformed redirect request".to_string()))?;
    let url = Url::parse("http://127.0.0.1/")
        .and_then(|base| base.join(target))
        .map_err(|e| BackendError::Auth(format!("malformed redirect target: {e}")))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(BackendError::Auth(format!("authorization denied: {error}")));
    }
    let Some(code) = code else {
        return Ok(None);
    };
    if state.as_deref() != Some(expected_state) {
        return Err(BackendError::Auth(
            "state mismatch in authorization redirect".to_string(),
        ));
    }
    Ok(Some(code))
}

fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}
