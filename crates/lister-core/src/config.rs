//! Runtime and preset configuration
//!
//! Settings come from `lister.toml` (a `[runtime]` table plus `[presets.<kind>]`
//! definitions) and can be overridden from the environment.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::definition::ListerDefinition;
use crate::error::{ListerError, Result};

/// Default quiet period before a query-driven refetch
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Default header carrying the request id
pub const DEFAULT_REQUEST_ID_HEADER: &str = "X-Lister-Request-Id";

/// Default timeout for list requests
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Default config file name
pub const CONFIG_FILE: &str = "lister.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Prefix for relative endpoints
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
            request_id_header: DEFAULT_REQUEST_ID_HEADER.to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            http: HttpConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `LISTER_DEBOUNCE_MS`, `LISTER_BASE_URL` and `LISTER_HTTP_TIMEOUT`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(debounce) = std::env::var("LISTER_DEBOUNCE_MS") {
            if let Ok(ms) = debounce.parse::<u64>() {
                self.debounce_ms = ms.min(10_000);
            }
        }

        if let Ok(url) = std::env::var("LISTER_BASE_URL") {
            if !url.is_empty() {
                self.http.base_url = Some(url);
            }
        }

        if let Ok(timeout) = std::env::var("LISTER_HTTP_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                self.http.timeout_seconds = seconds;
            }
        }

        self.http.timeout_seconds = self.http.timeout_seconds.clamp(1, 300);
        self
    }
}

/// Contents of `lister.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListerConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub presets: BTreeMap<String, ListerDefinition>,
}

impl ListerConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: ListerConfig = toml::from_str(content)?;
        config.runtime = config.runtime.with_env_overrides();
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ListerError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

fn default_debounce() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_timeout() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECONDS
}

fn default_request_id_header() -> String {
    DEFAULT_REQUEST_ID_HEADER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_config_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.http.request_id_header, "X-Lister-Request-Id");
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        assert!(config.http.base_url.is_none());
    }

    #[test]
    fn test_parse_presets() {
        let config = ListerConfig::parse(
            r#"
[runtime]
debounce_ms = 100

[runtime.http]
base_url = "https://api.example.com"

[presets.users.source]
endpoint = "/users"

[presets.users.mapping]
value = "id"
label = "name"

[presets.teams]
selector = "items"
source = { endpoint = "/teams", method = "POST" }
mapping = { value = "slug" }
"#,
        )
        .unwrap();

        assert_eq!(config.runtime.debounce_ms, 100);
        assert_eq!(
            config.runtime.http.base_url.as_deref(),
            Some("https://api.example.com")
        );
        assert_eq!(config.presets.len(), 2);
        assert_eq!(config.presets["teams"].source.endpoint, "/teams");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ListerConfig::load(&dir.path().join(CONFIG_FILE)).unwrap_err();
        assert_eq!(err.code(), "config_not_found");
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "presets = [").unwrap();
        let err = ListerConfig::load(&path).unwrap_err();
        assert_eq!(err.code(), "toml_error");
    }
}
