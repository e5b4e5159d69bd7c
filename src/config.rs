use crate::error::{ProbeError, ProbeResult};
use crate::logging::log_debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const BASE_URL_ENV: &str = "PROXY_PROBE_BASE_URL";
pub const ADMIN_KEY_ENV: &str = "PROXY_PROBE_ADMIN_KEY";
pub const LEGACY_KEYS_ENV: &str = "PROXY_PROBE_LEGACY_KEYS";
pub const HEADER_LIMIT_ENV: &str = "PROXY_PROBE_HEADER_LIMIT";
pub const TIMEOUT_ENV: &str = "PROXY_PROBE_TIMEOUT_SECS";

/// Body text the proxy returns when the upstream image provider is unreachable
pub const DEFAULT_UPSTREAM_ERROR_MARKER: &str = "Connection error";

const LEGACY_KEY: &str = "sk-ecMXHujzUtKCvHcwacdaTw";

/// nginx rejects upstream responses whose headers reach 4kb.
pub const DEFAULT_HEADER_LIMIT: usize = 4096;

/// Model names used by the scenarios
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioModels {
    pub chat: String,
    pub embedding: String,
    pub image: String,
    /// Model configured on the proxy with a 1 request/minute budget
    pub rate_limited: String,
}

impl Default for ScenarioModels {
    fn default() -> Self {
        Self {
            chat: "gpt-4".to_string(),
            embedding: "text-embedding-ada-002".to_string(),
            image: "dall-e-2".to_string(),
            rate_limited: "fake-openai-endpoint-2".to_string(),
        }
    }
}

/// Connection and expectation settings for one proxy under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub base_url: String,
    /// Master key allowed to issue keys and users
    pub admin_key: String,
    /// Pre-generated keys that must keep working, tried in order until one
    /// authenticates. Listing a key twice retries it.
    pub legacy_keys: Vec<String>,
    /// Exclusive ceiling on response header name + value bytes
    pub header_limit: usize,
    pub request_timeout: Duration,
    /// Concurrent calls fired at the rate-limited model
    pub rate_limit_parallel_calls: usize,
    /// Accept image generation failures whose body reports an upstream connection error
    pub tolerate_upstream_connection_error: bool,
    /// Substring of a failed image response body that marks an upstream connection error
    pub upstream_error_marker: String,
    pub models: ScenarioModels,
    /// Allow-list sent to /key/generate
    pub key_models: Vec<String>,
    /// Allow-list sent to /user/new
    pub user_models: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        let models = ScenarioModels::default();
        let user_models = vec![
            models.chat.clone(),
            models.embedding.clone(),
            models.image.clone(),
        ];
        let mut key_models = user_models.clone();
        key_models.push(models.rate_limited.clone());

        Self {
            base_url: "http://0.0.0.0:4000".to_string(),
            admin_key: "sk-1234".to_string(),
            // Same key twice: the second attempt covers a proxy that has just
            // switched between its primary and replica databases.
            legacy_keys: vec![LEGACY_KEY.to_string(), LEGACY_KEY.to_string()],
            header_limit: DEFAULT_HEADER_LIMIT,
            request_timeout: Duration::from_secs(120),
            rate_limit_parallel_calls: 2,
            tolerate_upstream_connection_error: true,
            upstream_error_marker: DEFAULT_UPSTREAM_ERROR_MARKER.to_string(),
            models,
            key_models,
            user_models,
        }
    }
}

impl ProxyConfig {
    /// Config pointing at `base_url` with every other setting at its default
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with the `PROXY_PROBE_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ConfigurationError`] if a numeric variable does
    /// not parse or the resulting config fails [`validate`](Self::validate).
    pub fn from_env() -> ProbeResult<Self> {
        let mut config = Self::default();

        if let Some(base_url) = read_env(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        if let Some(admin_key) = read_env(ADMIN_KEY_ENV) {
            config.admin_key = admin_key;
        }
        if let Some(keys) = read_env(LEGACY_KEYS_ENV) {
            config.legacy_keys = parse_key_list(&keys);
        }
        if let Some(limit) = read_env(HEADER_LIMIT_ENV) {
            config.header_limit = limit.parse().map_err(|e| {
                ProbeError::configuration_error(format!("{HEADER_LIMIT_ENV}={limit}: {e}"))
            })?;
        }
        if let Some(secs) = read_env(TIMEOUT_ENV) {
            let secs: u64 = secs.parse().map_err(|e| {
                ProbeError::configuration_error(format!("{TIMEOUT_ENV}={secs}: {e}"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        log_debug!(
            base_url = %config.base_url,
            legacy_key_count = config.legacy_keys.len(),
            header_limit = config.header_limit,
            timeout_seconds = config.request_timeout.as_secs(),
            "Loaded proxy config from environment"
        );

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ConfigurationError`] if:
    /// - The base URL is empty or not http(s)
    /// - The admin key is empty
    /// - The image tolerance is on with an empty upstream error marker
    /// - The header limit is zero
    /// - Fewer than two parallel calls are configured for the rate-limit race
    pub fn validate(&self) -> ProbeResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ProbeError::configuration_error("Proxy base URL is required"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ProbeError::configuration_error(format!(
                "Proxy base URL must use http or https: {}",
                self.base_url
            )));
        }
        if self.admin_key.is_empty() {
            return Err(ProbeError::configuration_error("Admin key is required"));
        }
        if self.tolerate_upstream_connection_error && self.upstream_error_marker.is_empty() {
            return Err(ProbeError::configuration_error(
                "Upstream error marker must not be empty while the tolerance is enabled",
            ));
        }
        if self.header_limit == 0 {
            return Err(ProbeError::configuration_error(
                "Header limit must be greater than zero",
            ));
        }
        if self.rate_limit_parallel_calls < 2 {
            return Err(ProbeError::configuration_error(format!(
                "Rate-limit race needs at least 2 parallel calls, got {}",
                self.rate_limit_parallel_calls
            )));
        }
        Ok(())
    }

    /// Absolute URL for an endpoint path such as `/chat/completions`
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Split a comma separated key list, dropping blanks
pub(crate) fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}
