use crate::client::BrowserProfile;
use crate::error::{ProxyError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8805;
pub const DEFAULT_BASE_URL: &str = "https://chutes.ai";
pub const DEFAULT_CHAT_PATH: &str = "/app/api/chat";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    #[serde(default)]
    pub profile: BrowserProfile,
    /// How long to wait for the backend to accept a connection
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff step; doubled after every failed attempt
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

/// Static bearer secret shared with clients. `None` disables the check.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_chat_path() -> String {
    DEFAULT_CHAT_PATH.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_path: default_chat_path(),
            profile: BrowserProfile::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl AuthConfig {
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ProxyConfig::default();
        config.apply_overrides(&lookup)?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ProxyError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml(&contents)?;

        // Allow environment variables to override file config
        config.apply_overrides(&|key: &str| env::var(key).ok())?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: ProxyConfig = toml::from_str(contents)
            .map_err(|e| ProxyError::ConfigError(format!("Failed to parse config file: {}", e)))?;
        config.auth.token = config.auth.token.filter(|t| !t.is_empty());
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_var("PORT", &port)?;
        }
        if let Some(token) = lookup("AUTH_TOKEN") {
            self.auth.token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(base_url) = lookup("CHUTES_BASE_URL") {
            self.upstream.base_url = base_url;
        }
        if let Some(chat_path) = lookup("CHUTES_CHAT_PATH") {
            self.upstream.chat_path = chat_path;
        }
        if let Some(profile) = lookup("CHUTES_PROFILE") {
            self.upstream.profile = parse_var("CHUTES_PROFILE", &profile)?;
        }
        if let Some(timeout) = lookup("CHUTES_CONNECT_TIMEOUT_SECS") {
            self.upstream.connect_timeout_secs = parse_var("CHUTES_CONNECT_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(retries) = lookup("CHUTES_MAX_RETRIES") {
            self.upstream.max_retries = parse_var("CHUTES_MAX_RETRIES", &retries)?;
        }
        if let Some(backoff) = lookup("CHUTES_BACKOFF_BASE_MS") {
            self.upstream.backoff_base_ms = parse_var("CHUTES_BACKOFF_BASE_MS", &backoff)?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.upstream.base_url.is_empty() {
            return Err(ProxyError::ConfigError("Base URL is empty".to_string()));
        }

        reqwest::Url::parse(&self.upstream.base_url).map_err(|e| {
            ProxyError::ConfigError(format!(
                "Invalid base URL {}: {}",
                self.upstream.base_url, e
            ))
        })?;

        if !self.upstream.chat_path.starts_with('/') {
            return Err(ProxyError::ConfigError(
                "Chat path must start with '/'".to_string(),
            ));
        }

        if self.upstream.max_retries == 0 {
            return Err(ProxyError::ConfigError(
                "Max retries must be greater than 0".to_string(),
            ));
        }

        if self.upstream.connect_timeout_secs == 0 {
            return Err(ProxyError::ConfigError(
                "Connect timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ProxyError::ConfigError(format!("Invalid {} value: {}", key, e)))
}
