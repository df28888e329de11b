//! Client configuration
//!
//! `Config` is the already-validated input of the client factory. It can be
//! assembled with the builder, deserialized from YAML/JSON, or read from the
//! same environment variables the DigitalOcean tooling uses.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Default DigitalOcean API base URL
pub const DEFAULT_API_ENDPOINT: &str = "https://api.digitalocean.com";

/// Default Spaces endpoint template
pub const DEFAULT_SPACES_ENDPOINT: &str = "https://{{.Region}}.digitaloceanspaces.com";

/// Default product name used in the user agent
pub const DEFAULT_PRODUCT: &str = "Terraform";

// ============================================================================
// Environment Variables
// ============================================================================

const ENV_TOKEN: &str = "DIGITALOCEAN_TOKEN";
const ENV_ACCESS_TOKEN: &str = "DIGITALOCEAN_ACCESS_TOKEN";
const ENV_API_URL: &str = "DIGITALOCEAN_API_URL";
const ENV_SPACES_ENDPOINT: &str = "SPACES_ENDPOINT_URL";
const ENV_SPACES_ACCESS_KEY: &str = "SPACES_ACCESS_KEY_ID";
const ENV_SPACES_SECRET_KEY: &str = "SPACES_SECRET_ACCESS_KEY";
const ENV_RETRY_MAX: &str = "DIGITALOCEAN_HTTP_RETRY_MAX";
const ENV_RETRY_WAIT_MIN: &str = "DIGITALOCEAN_HTTP_RETRY_WAIT_MIN";
const ENV_RETRY_WAIT_MAX: &str = "DIGITALOCEAN_HTTP_RETRY_WAIT_MAX";
const ENV_REQUESTS_PER_SECOND: &str = "DIGITALOCEAN_REQUESTS_PER_SECOND";

// ============================================================================
// Credentials
// ============================================================================

/// Spaces access key pair. Storage access needs both halves.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub access_id: String,
    #[serde(default)]
    pub secret_key: String,
}

impl Credentials {
    pub fn new(access_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// True when both halves are present
    pub fn is_complete(&self) -> bool {
        !self.access_id.is_empty() && !self.secret_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("secret_key", &redacted(&self.secret_key))
            .finish()
    }
}

// ============================================================================
// Config
// ============================================================================

/// Input to the client factory
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// API bearer token
    #[serde(default)]
    pub token: String,

    /// API base URL
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Spaces endpoint template, see [`crate::template`]
    #[serde(default = "default_spaces_endpoint")]
    pub spaces_endpoint: String,

    /// Spaces access key pair
    #[serde(default, flatten)]
    pub credentials: Credentials,

    /// Product name in the user agent
    #[serde(default = "default_product")]
    pub product: String,

    /// Product version in the user agent
    #[serde(default)]
    pub product_version: String,

    /// Retries after the first attempt
    #[serde(default = "default_retry_max")]
    pub http_retry_max: u32,

    /// Minimum wait between retries, in seconds
    #[serde(default = "default_retry_wait_min")]
    pub http_retry_wait_min: f64,

    /// Maximum wait between retries, in seconds
    #[serde(default = "default_retry_wait_max")]
    pub http_retry_wait_max: f64,

    /// Client-side request rate cap; 0 disables throttling
    #[serde(default)]
    pub requests_per_second: u32,

    /// Per-attempt request timeout, in seconds
    #[serde(default)]
    pub request_timeout: Option<f64>,
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_spaces_endpoint() -> String {
    DEFAULT_SPACES_ENDPOINT.to_string()
}

fn default_product() -> String {
    DEFAULT_PRODUCT.to_string()
}

fn default_retry_max() -> u32 {
    4
}

fn default_retry_wait_min() -> f64 {
    1.0
}

fn default_retry_wait_max() -> f64 {
    30.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_endpoint: default_api_endpoint(),
            spaces_endpoint: default_spaces_endpoint(),
            credentials: Credentials::default(),
            product: default_product(),
            product_version: String::new(),
            http_retry_max: default_retry_max(),
            http_retry_wait_min: default_retry_wait_min(),
            http_retry_wait_max: default_retry_wait_max(),
            requests_per_second: 0,
            request_timeout: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &redacted(&self.token))
            .field("api_endpoint", &self.api_endpoint)
            .field("spaces_endpoint", &self.spaces_endpoint)
            .field("credentials", &self.credentials)
            .field("product", &self.product)
            .field("product_version", &self.product_version)
            .field("http_retry_max", &self.http_retry_max)
            .field("http_retry_wait_min", &self.http_retry_wait_min)
            .field("http_retry_wait_max", &self.http_retry_wait_max)
            .field("requests_per_second", &self.requests_per_second)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a YAML (or JSON, which is valid YAML) document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(token) = get(ENV_TOKEN).or_else(|| get(ENV_ACCESS_TOKEN)) {
            config.token = token;
        }
        if let Some(url) = get(ENV_API_URL) {
            config.api_endpoint = url;
        }
        if let Some(endpoint) = get(ENV_SPACES_ENDPOINT) {
            config.spaces_endpoint = endpoint;
        }
        if let Some(access_id) = get(ENV_SPACES_ACCESS_KEY) {
            config.credentials.access_id = access_id;
        }
        if let Some(secret_key) = get(ENV_SPACES_SECRET_KEY) {
            config.credentials.secret_key = secret_key;
        }
        if let Some(value) = get(ENV_RETRY_MAX) {
            config.http_retry_max = parse_env(ENV_RETRY_MAX, &value)?;
        }
        if let Some(value) = get(ENV_RETRY_WAIT_MIN) {
            config.http_retry_wait_min = parse_env(ENV_RETRY_WAIT_MIN, &value)?;
        }
        if let Some(value) = get(ENV_RETRY_WAIT_MAX) {
            config.http_retry_wait_max = parse_env(ENV_RETRY_WAIT_MAX, &value)?;
        }
        if let Some(value) = get(ENV_REQUESTS_PER_SECOND) {
            config.requests_per_second = parse_env(ENV_REQUESTS_PER_SECOND, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the numeric invariants
    pub fn validate(&self) -> Result<()> {
        check_seconds("http_retry_wait_min", self.http_retry_wait_min)?;
        check_seconds("http_retry_wait_max", self.http_retry_wait_max)?;
        if self.http_retry_wait_min > self.http_retry_wait_max {
            return Err(Error::invalid_value(
                "http_retry_wait_min",
                format!(
                    "{} is greater than http_retry_wait_max {}",
                    self.http_retry_wait_min, self.http_retry_wait_max
                ),
            ));
        }
        if let Some(timeout) = self.request_timeout {
            check_seconds("request_timeout", timeout)?;
        }
        Ok(())
    }

    /// Minimum retry wait as a duration
    pub fn retry_wait_min(&self) -> Duration {
        seconds(self.http_retry_wait_min)
    }

    /// Maximum retry wait as a duration
    pub fn retry_wait_max(&self) -> Duration {
        seconds(self.http_retry_wait_max)
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.request_timeout.map(seconds)
    }

    /// The `<Product>/<Version>` identifier
    pub fn product_identifier(&self) -> String {
        format!("{}/{}", self.product, self.product_version)
    }
}

fn check_seconds(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::invalid_value(field, "must be a finite number of seconds"));
    }
    if value < 0.0 {
        return Err(Error::invalid_value(field, "must not be negative"));
    }
    Duration::try_from_secs_f64(value)
        .map_err(|_| Error::invalid_value(field, format!("{value} seconds is out of range")))?;
    Ok(())
}

/// Seconds to a duration, saturating where validation would have failed
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::invalid_value(key, format!("'{value}': {e}")))
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Config`]
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the bearer token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    /// Set the API base URL
    pub fn api_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.api_endpoint = url.into();
        self
    }

    /// Set the Spaces endpoint template
    pub fn spaces_endpoint(mut self, template: impl Into<String>) -> Self {
        self.config.spaces_endpoint = template.into();
        self
    }

    /// Set the Spaces key pair
    pub fn credentials(mut self, access_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.config.credentials = Credentials::new(access_id, secret_key);
        self
    }

    /// Set the product name
    pub fn product(mut self, product: impl Into<String>) -> Self {
        self.config.product = product.into();
        self
    }

    /// Set the product version
    pub fn product_version(mut self, version: impl Into<String>) -> Self {
        self.config.product_version = version.into();
        self
    }

    /// Set max retries
    pub fn retry_max(mut self, retries: u32) -> Self {
        self.config.http_retry_max = retries;
        self
    }

    /// Set min/max retry wait in seconds
    pub fn retry_wait(mut self, min: f64, max: f64) -> Self {
        self.config.http_retry_wait_min = min;
        self.config.http_retry_wait_max = max;
        self
    }

    /// Set the client-side request rate cap
    pub fn requests_per_second(mut self, rps: u32) -> Self {
        self.config.requests_per_second = rps;
        self
    }

    /// Set the per-attempt timeout in seconds
    pub fn request_timeout(mut self, seconds: f64) -> Self {
        self.config.request_timeout = Some(seconds);
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
