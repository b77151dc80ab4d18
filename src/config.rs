//! Settings loader and credential gate for the homework watch bot.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Non-secret settings, mirroring the YAML schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub practicum: Practicum,
}

/// Loop timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    #[serde(default = "default_retry_period_secs")]
    pub retry_period_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Remote API location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Practicum {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_retry_period_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for App {
    fn default() -> Self {
        Self {
            retry_period_secs: default_retry_period_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for Practicum {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

impl Settings {
    pub fn retry_period(&self) -> Duration {
        Duration::from_secs(self.app.retry_period_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.app.request_timeout_secs)
    }

    /// Parsed endpoint. Only valid after `validate` has passed.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.practicum.endpoint.trim())
            .map_err(|_| ConfigError::Invalid("practicum.endpoint must be a valid URL"))
    }
}

/// Load settings from a YAML file and validate them.
/// - If `path` is None, the built-in defaults are used.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Settings::default(),
    };
    validate(&settings)?;
    Ok(settings)
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    if settings.app.retry_period_secs == 0 {
        return Err(ConfigError::Invalid("app.retry_period_secs must be > 0"));
    }
    if settings.app.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid("app.request_timeout_secs must be > 0"));
    }
    if settings.practicum.endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid("practicum.endpoint must be non-empty"));
    }
    settings.endpoint_url()?;
    Ok(())
}

/// Returns an example YAML settings file with the default values.
pub fn example() -> &'static str {
    r#"app:
  retry_period_secs: 600
  request_timeout_secs: 30

practicum:
  endpoint: "https://practicum.yandex.ru/api/user_api/homework_statuses/"
"#
}

/// The three secrets the bot needs, read once at startup.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"[REDACTED]")
            .field("telegram_token", &"[REDACTED]")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

impl Credentials {
    /// Read the secrets from the process environment. Unset variables become
    /// empty strings; `check_credentials` decides whether that is acceptable.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).unwrap_or_default().trim().to_string();
        Self {
            practicum_token: read(PRACTICUM_TOKEN_VAR),
            telegram_token: read(TELEGRAM_TOKEN_VAR),
            telegram_chat_id: read(TELEGRAM_CHAT_ID_VAR),
        }
    }

    /// Names of the variables that are missing or blank.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (PRACTICUM_TOKEN_VAR, &self.practicum_token),
            (TELEGRAM_TOKEN_VAR, &self.telegram_token),
            (TELEGRAM_CHAT_ID_VAR, &self.telegram_chat_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Startup gate: true iff every secret is present.
pub fn check_credentials(creds: &Credentials) -> bool {
    let missing = creds.missing();
    if missing.is_empty() {
        return true;
    }
    error!(
        critical = true,
        missing = ?missing,
        "required environment variables are missing"
    );
    false
}
