//! Configuration types
//!
//! [`ApiConfig`] carries the process-wide settings of an
//! [`ApiClient`](crate::ApiClient): base endpoint, auth token, throttle limits
//! and transport options. It can be built in code, loaded from a YAML or JSON
//! file, and overridden from the environment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`ApiConfig::endpoint`]
pub const ENDPOINT_ENV: &str = "THROTTLED_API_ENDPOINT";

/// Environment variable overriding [`ApiConfig::token`]
pub const TOKEN_ENV: &str = "THROTTLED_API_TOKEN";

const DEFAULT_REQUESTS: i64 = 600;
const DEFAULT_SECONDS: i64 = 600;

// ============================================================================
// Throttle Config
// ============================================================================

/// Sliding-window throttle limits
///
/// At most `requests` requests are released within any trailing window of
/// `seconds` seconds. Non-positive values fall back to 600.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Maximum number of requests per window
    #[serde(default = "default_requests")]
    pub requests: i64,

    /// Window length in seconds
    #[serde(default = "default_seconds")]
    pub seconds: i64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            requests: default_requests(),
            seconds: default_seconds(),
        }
    }
}

fn default_requests() -> i64 {
    DEFAULT_REQUESTS
}

fn default_seconds() -> i64 {
    DEFAULT_SECONDS
}

impl ThrottleConfig {
    /// Create a new throttle config
    pub fn new(requests: i64, seconds: i64) -> Self {
        Self { requests, seconds }
    }

    /// Effective request ceiling
    pub fn max_requests(&self) -> usize {
        positive_or_default(self.requests, DEFAULT_REQUESTS)
    }

    /// Effective window length, in one-second slots
    pub fn window_seconds(&self) -> usize {
        positive_or_default(self.seconds, DEFAULT_SECONDS)
    }
}

fn positive_or_default(value: i64, default: i64) -> usize {
    if value > 0 {
        value as usize
    } else {
        default as usize
    }
}

// ============================================================================
// API Config
// ============================================================================

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base endpoint; request paths are appended verbatim
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Token sent as the `token` query parameter
    #[serde(default)]
    pub token: Option<String>,

    /// Throttle limits
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Append-only file receiving failed request messages
    #[serde(default)]
    pub error_log: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            throttle: ThrottleConfig::default(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            error_log: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("throttled-api/{}", env!("CARGO_PKG_VERSION"))
}

impl ApiConfig {
    /// Create a new config builder
    pub fn builder() -> ApiConfigBuilder {
        ApiConfigBuilder::default()
    }

    /// Load config from a YAML or JSON file
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config(format!("Config file '{}' not found", path.display()))
            } else {
                Error::Io(e)
            }
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse config from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse config from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Apply endpoint and token overrides from the environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply endpoint and token overrides read through `lookup`
    #[must_use]
    pub(crate) fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            self.endpoint = Some(endpoint);
        }
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        self
    }
}

/// Builder for [`ApiConfig`]
#[derive(Default)]
pub struct ApiConfigBuilder {
    config: ApiConfig,
}

impl ApiConfigBuilder {
    /// Set the endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Set the auth token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// Set throttle limits
    pub fn throttle(mut self, requests: i64, seconds: i64) -> Self {
        self.config.throttle = ThrottleConfig::new(requests, seconds);
        self
    }

    /// Set the request timeout in seconds
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.timeout_seconds = seconds;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Set the error log file
    pub fn error_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.error_log = Some(path.into());
        self
    }

    /// Build the config
    pub fn build(self) -> ApiConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test]
    fn test_throttle_default() {
        let throttle = ThrottleConfig::default();
        assert_eq!(throttle.max_requests(), 600);
        assert_eq!(throttle.window_seconds(), 600);
    }

    #[test_case(0, 0, 600, 600; "zeros")]
    #[test_case(-5, 10, 600, 10; "negative requests")]
    #[test_case(2, -1, 2, 600; "negative seconds")]
    #[test_case(2, 4, 2, 4; "positive values")]
    #[test_case(1, i64::MAX, 1, i64::MAX as usize; "very long window")]
    fn test_throttle_normalization(requests: i64, seconds: i64, max: usize, window: usize) {
        let throttle = ThrottleConfig::new(requests, seconds);
        assert_eq!(throttle.max_requests(), max);
        assert_eq!(throttle.window_seconds(), window);
    }

    #[test]
    fn test_config_builder() {
        let config = ApiConfig::builder()
            .endpoint("http://example.com")
            .token("ABC")
            .throttle(2, 4)
            .timeout_seconds(5)
            .user_agent("test-agent/1.0")
            .error_log("/tmp/errors.log")
            .build();

        assert_eq!(config.endpoint.as_deref(), Some("http://example.com"));
        assert_eq!(config.token.as_deref(), Some("ABC"));
        assert_eq!(config.throttle, ThrottleConfig::new(2, 4));
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert_eq!(config.error_log, Some(PathBuf::from("/tmp/errors.log")));
    }

    #[test]
    fn test_config_defaults() {
        let config = ApiConfig::default();
        assert!(config.endpoint.is_none());
        assert!(config.token.is_none());
        assert_eq!(config.throttle, ThrottleConfig::default());
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.user_agent.starts_with("throttled-api/"));
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r"
endpoint: https://api.example.com
token: secret
throttle:
  requests: 10
";
        let config = ApiConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.throttle.max_requests(), 10);
        assert_eq!(config.throttle.window_seconds(), 600);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{"endpoint": "http://localhost", "throttle": {"requests": 2, "seconds": 4}}"#;
        let config = ApiConfig::from_json(json).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost"));
        assert_eq!(config.throttle, ThrottleConfig::new(2, 4));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.json");
        std::fs::write(&path, r#"{"token": "T"}"#).unwrap();

        let config = ApiConfig::from_file(&path).unwrap();
        assert_eq!(config.token.as_deref(), Some("T"));
    }

    #[test]
    fn test_config_from_missing_file() {
        let err = ApiConfig::from_file("/nonexistent/api.yaml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_config_invalid_yaml() {
        let err = ApiConfig::from_yaml("throttle: [").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [(ENDPOINT_ENV, "http://env.example.com"), (TOKEN_ENV, "")]
            .into_iter()
            .collect();

        let config = ApiConfig::builder()
            .endpoint("http://file.example.com")
            .token("file-token")
            .build()
            .with_overrides_from(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.endpoint.as_deref(), Some("http://env.example.com"));
        // Empty values do not override
        assert_eq!(config.token.as_deref(), Some("file-token"));
    }
}
