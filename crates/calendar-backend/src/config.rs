//! Backend configuration: file locations, OAuth scopes, timezone, API base URL.
//!
//! Values are layered: built-in defaults, then an optional `KEY=VALUE` file, then
//! environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;

use crate::error::{BackendError, Result};

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Keys recognised in config files and the environment.
pub const KEY_CREDENTIALS: &str = "CALENDAR_CREDENTIALS";
pub const KEY_TOKEN_PATH: &str = "CALENDAR_TOKEN_PATH";
pub const KEY_TIMEZONE: &str = "CALENDAR_TIMEZONE";
pub const KEY_API_BASE: &str = "CALENDAR_API_BASE";
pub const KEY_SCOPES: &str = "CALENDAR_SCOPES";
pub const KEY_CALENDAR_ID: &str = "CALENDAR_ID";

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// OAuth client secrets downloaded from the Google Cloud console.
    pub credentials_path: PathBuf,
    /// Where the authorized user token is cached between runs.
    pub token_path: PathBuf,
    pub scopes: Vec<String>,
    /// IANA zone sent with free/busy queries and new events.
    pub timezone: String,
    pub api_base: String,
    pub calendar_id: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            scopes: vec![CALENDAR_SCOPE.to_string()],
            timezone: "UTC".to_string(),
            api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
            calendar_id: "primary".to_string(),
        }
    }
}

impl BackendConfig {
    /// Defaults, overlaid with `config_file` (if given) and then the process environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = config_file {
            let values = read_key_values(path)?;
            config.apply_overrides(|key| values.get(key).cloned())?;
        }
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overwrite fields for every key `lookup` knows about.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(KEY_CREDENTIALS) {
            self.credentials_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(KEY_TOKEN_PATH) {
            self.token_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(KEY_TIMEZONE) {
            self.timezone = v;
        }
        if let Some(v) = lookup(KEY_API_BASE) {
            self.api_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup(KEY_SCOPES) {
            let scopes: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if scopes.is_empty() {
                return Err(BackendError::Config(format!("{KEY_SCOPES} is empty")));
            }
            self.scopes = scopes;
        }
        if let Some(v) = lookup(KEY_CALENDAR_ID) {
            self.calendar_id = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.calendar_id.trim().is_empty() {
            return Err(BackendError::Config("calendar id is empty".to_string()));
        }
        Ok(())
    }

    /// The configured timezone, parsed.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| BackendError::Config(format!("invalid timezone: {}", self.timezone)))
    }
}

/// Read a dotenv-style `KEY=VALUE` file without touching the process environment.
fn read_key_values(path: &Path) -> Result<HashMap<String, String>> {
    let config_error =
        |e: dotenvy::Error| BackendError::Config(format!("cannot read {}: {e}", path.display()));

    dotenvy::from_path_iter(path)
        .map_err(config_error)?
        .map(|item| item.map_err(config_error))
        .collect()
}
