//! client configuration, read from a file, the environment, or explicit values

use std::time::Duration;

use serde::Deserialize;

use crate::errors::Error;

pub const DEFAULT_BASE_URL: &str = "https://demo.honistai.space";
const DEFAULT_USER_AGENT: &str = "honist-client-rust/0.1.0";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Log request/response method, URL, headers and body at debug level.
    pub debug_logging: bool,
    pub request_timeout_secs: u64,
    /// Seconds before `exp` at which an access token already counts as expired.
    pub token_expiry_skew_secs: u64,
    /// Secret for the `x-hmac-signature` header on authentication calls.
    pub hmac_secret: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            debug_logging: false,
            request_timeout_secs: 30,
            token_expiry_skew_secs: 30,
            hmac_secret: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_hmac_secret(mut self, secret: impl Into<String>) -> Self {
        self.hmac_secret = secret.into();
        self
    }

    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_token_expiry_skew(mut self, skew: Duration) -> Self {
        self.token_expiry_skew_secs = skew.as_secs();
        self
    }

    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Invalid config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `HONIST_*` environment variables.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = std::env::var("HONIST_BASE_URL")
            .map_err(|_| Error::Config("Missing HONIST_BASE_URL env var".to_string()))?;
        let mut config = Self::new(base_url);
        if let Ok(secret) = std::env::var("HONIST_HMAC_SECRET") {
            config.hmac_secret = secret;
        }
        if let Ok(flag) = std::env::var("HONIST_DEBUG_LOGGING") {
            config.debug_logging = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(secs) = env_secs("HONIST_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout_secs = secs;
        }
        if let Some(secs) = env_secs("HONIST_TOKEN_SKEW_SECS")? {
            config.token_expiry_skew_secs = secs;
        }
        if let Ok(agent) = std::env::var("HONIST_USER_AGENT") {
            config.user_agent = agent;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        reqwest::Url::parse(&self.base_url).map_err(|e| {
            Error::Config(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn token_expiry_skew(&self) -> Duration {
        Duration::from_secs(self.token_expiry_skew_secs)
    }
}

fn env_secs(name: &str) -> Result<Option<u64>, Error> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} must be a whole number of seconds"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("honist.json");
        std::fs::write(
            &path,
            r#"{"base_url": "https://api.example.test", "debug_logging": true}"#,
        )
        .unwrap();

        let config = ClientConfig::from_file(&path).expect("config loads");
        assert_eq!(config.base_url, "https://api.example.test");
        assert!(config.debug_logging);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.token_expiry_skew(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = ClientConfig::new("not a url").validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = ClientConfig::new(DEFAULT_BASE_URL)
            .with_request_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("timeout")));
    }
}
