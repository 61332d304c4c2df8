//! Configuration module
//!
//! Client configuration is environment-style: a `.env` file (if present) is
//! loaded first, then `MEDIABOX_*` variables are read.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{endpoints, POLL_INTERVAL, POLL_MAX_ATTEMPTS, REQUEST_TIMEOUT};
use crate::error::ClientError;

const ENV_PREFIX: &str = "MEDIABOX_";

/// Raw environment view, deserialized by `envy` from `MEDIABOX_*` variables.
#[derive(Debug, Default, Deserialize)]
struct EnvConfig {
    api_url: Option<String>,
    csrf_path: Option<String>,
    request_timeout_secs: Option<u64>,
    poll_interval_ms: Option<u64>,
    poll_max_attempts: Option<u32>,
}

/// Settings for the API client and the video status poller.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base API URL without trailing slash (`MEDIABOX_API_URL`).
    pub base_api_url: Option<String>,
    /// CSRF endpoint path (`MEDIABOX_CSRF_PATH`). Without it no CSRF token is fetched.
    pub csrf_path: Option<String>,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_max_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_api_url: None,
            csrf_path: None,
            request_timeout: REQUEST_TIMEOUT,
            poll_interval: POLL_INTERVAL,
            poll_max_attempts: POLL_MAX_ATTEMPTS,
        }
    }
}

/// OAuth identity providers supported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(OAuthProvider::Google),
            "github" => Ok(OAuthProvider::Github),
            other => Err(ClientError::InvalidInput(format!(
                "Unknown OAuth provider '{}'. Must be: google or github",
                other
            ))),
        }
    }
}

impl ClientConfig {
    pub fn new(base_api_url: impl Into<String>) -> Self {
        Self {
            base_api_url: Some(normalize_base_url(&base_api_url.into())),
            ..Self::default()
        }
    }

    pub fn with_csrf_path(mut self, path: impl Into<String>) -> Self {
        self.csrf_path = Some(path.into());
        self
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let raw: EnvConfig = envy::prefixed(ENV_PREFIX)
            .from_env()
            .map_err(|e| anyhow::anyhow!("Invalid {}* environment: {}", ENV_PREFIX, e))?;

        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: EnvConfig) -> Self {
        let config = Self {
            base_api_url: raw
                .api_url
                .filter(|s| !s.trim().is_empty())
                .map(|s| normalize_base_url(&s)),
            csrf_path: raw.csrf_path.filter(|s| !s.trim().is_empty()),
            request_timeout: raw
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(REQUEST_TIMEOUT),
            poll_interval: raw
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(POLL_INTERVAL),
            poll_max_attempts: raw.poll_max_attempts.unwrap_or(POLL_MAX_ATTEMPTS),
        };

        if config.csrf_path.is_none() {
            tracing::warn!("MEDIABOX_CSRF_PATH is not set; unsafe requests will carry no CSRF token");
        }

        config
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(base) = &self.base_api_url {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(anyhow::anyhow!(
                    "MEDIABOX_API_URL must start with http:// or https://"
                ));
            }
            url::Url::parse(base)
                .map_err(|e| anyhow::anyhow!("MEDIABOX_API_URL is not a valid URL: {}", e))?;
        }

        if let Some(path) = &self.csrf_path {
            if !path.starts_with('/') {
                return Err(anyhow::anyhow!("MEDIABOX_CSRF_PATH must start with '/'"));
            }
        }

        if self.poll_max_attempts == 0 {
            return Err(anyhow::anyhow!(
                "MEDIABOX_POLL_MAX_ATTEMPTS must be greater than zero"
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(anyhow::anyhow!(
                "MEDIABOX_POLL_INTERVAL_MS must be greater than zero"
            ));
        }

        Ok(())
    }

    /// Base API URL, or a configuration error naming the missing variable.
    pub fn require_base_url(&self) -> Result<&str, ClientError> {
        self.base_api_url.as_deref().ok_or_else(|| {
            ClientError::Config(
                "Missing MEDIABOX_API_URL environment variable".to_string(),
            )
        })
    }

    /// Redirect target that starts the OAuth flow for `provider`.
    pub fn oauth_login_url(&self, provider: OAuthProvider) -> Result<String, ClientError> {
        let base = self.require_base_url()?;
        let url = url::Url::parse(&format!(
            "{}{}{}",
            base,
            endpoints::OAUTH_LOGIN,
            provider.as_str()
        ))?;
        Ok(url.to_string())
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
