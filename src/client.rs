//! Client factory and the combined API + storage handle
//!
//! [`ClientFactory::build`] validates the config, wires the transport chain
//! and returns a [`CombinedClient`]. Storage sessions are opened per region
//! on demand and never cached.

use crate::api::ApiClient;
use crate::auth::StaticTokenSource;
use crate::config::{Config, Credentials};
use crate::error::{Error, Result};
use crate::events::{self, ClientEvent, SharedSink};
use crate::http::backoff::system_clock;
use crate::http::{
    Clock, RateLimitBackoff, RateLimiter, RateLimiterConfig, ReqwestTransport, RetryConfig,
    SharedTransport, TransportChain,
};
use crate::storage::StorageSession;
use crate::template::EndpointTemplate;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Label used by the logging stage
pub const SERVICE_NAME: &str = "DigitalOcean";

// ============================================================================
// Factory
// ============================================================================

/// Builds a [`CombinedClient`] from a [`Config`]
pub struct ClientFactory {
    config: Config,
    sink: SharedSink,
    clock: Clock,
    base: Option<SharedTransport>,
}

impl ClientFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sink: events::noop(),
            clock: system_clock(),
            base: None,
        }
    }

    /// Where construction and backoff events go
    #[must_use]
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Clock used to interpret `RateLimit-Reset`
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the innermost reqwest transport
    #[must_use]
    pub fn with_base_transport(mut self, base: SharedTransport) -> Self {
        self.base = Some(base);
        self
    }

    pub fn build(self) -> Result<CombinedClient> {
        let config = self.config;
        config.validate()?;

        let base_url = Url::parse(&config.api_endpoint).map_err(|source| Error::InvalidEndpoint {
            endpoint: config.api_endpoint.clone(),
            source,
        })?;
        let template = EndpointTemplate::parse(&config.spaces_endpoint)?;

        let token_source = Arc::new(StaticTokenSource::new(config.token.as_str()));
        let base: SharedTransport = match self.base {
            Some(base) => base,
            None => Arc::new(ReqwestTransport::new(config.timeout())?),
        };

        let mut chain = TransportChain::new();
        if config.requests_per_second > 0 {
            let limiter = RateLimiter::new(&RateLimiterConfig::per_second(
                config.requests_per_second,
            ));
            chain = chain.throttle(limiter);
        }
        let backoff = RateLimitBackoff::new(self.sink.clone()).with_clock(self.clock);
        let transport = chain
            .retry(
                RetryConfig::new(
                    config.http_retry_max,
                    config.retry_wait_min(),
                    config.retry_wait_max(),
                ),
                Arc::new(backoff),
            )
            .authenticate(token_source)
            .log(SERVICE_NAME)
            .build(base)?;

        debug!("Transport chain: {:?}", transport);

        let user_agent = format!(
            "{} {}/{}",
            config.product_identifier(),
            crate::NAME,
            crate::VERSION
        );
        let api = ApiClient::new(base_url, Arc::new(transport), user_agent);

        self.sink.record(ClientEvent::Configured {
            base_url: api.base_url().to_string(),
        });

        Ok(CombinedClient {
            api,
            template: Arc::new(template),
            credentials: config.credentials,
        })
    }
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("config", &self.config)
            .field("custom_base", &self.base.is_some())
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Build a client with the default sink and transport
    pub fn client(&self) -> Result<CombinedClient> {
        ClientFactory::new(self.clone()).build()
    }
}

// ============================================================================
// Combined handle
// ============================================================================

/// API client plus the means to open storage sessions
#[derive(Debug, Clone)]
pub struct CombinedClient {
    api: ApiClient,
    template: Arc<EndpointTemplate>,
    credentials: Credentials,
}

impl CombinedClient {
    pub fn api_client(&self) -> &ApiClient {
        &self.api
    }

    /// Storage endpoint for a region
    pub fn endpoint(&self, region: &str) -> String {
        self.template.render(region)
    }

    pub fn template(&self) -> &EndpointTemplate {
        &self.template
    }

    /// Open a storage session for a region
    pub fn storage_session(&self, region: &str) -> Result<StorageSession> {
        if !self.credentials.is_complete() {
            return Err(Error::CredentialsMissing);
        }

        let endpoint = self.endpoint(region);
        debug!("Opening storage session for region {} at {}", region, endpoint);
        StorageSession::new(&endpoint, self.credentials.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use crate::http::Capability;
    use pretty_assertions::assert_eq;

    fn config() -> Config {
        Config::builder()
            .token("dop_v1_test")
            .product_version("2.40.0")
            .credentials("DO00EXAMPLE", "secret")
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_defaults() {
        let client = config().client().unwrap();
        let api = client.api_client();

        assert_eq!(api.base_url().as_str(), "https://api.digitalocean.com/");
        assert_eq!(
            api.user_agent(),
            format!("Terraform/2.40.0 ocean-client/{}", crate::VERSION)
        );
        assert_eq!(
            api.capabilities(),
            vec![
                Capability::Retries,
                Capability::Authenticates,
                Capability::Logs
            ]
        );
    }

    #[test]
    fn test_throttle_enabled() {
        let mut config = config();
        config.requests_per_second = 5;
        let client = config.client().unwrap();
        assert_eq!(
            client.api_client().capabilities(),
            vec![
                Capability::Throttles,
                Capability::Retries,
                Capability::Authenticates,
                Capability::Logs
            ]
        );
    }

    #[test]
    fn test_configured_event() {
        let sink = Arc::new(RecordingSink::new());
        let mut config = config();
        config.api_endpoint = "https://api.example.com".to_string();

        ClientFactory::new(config)
            .with_sink(sink.clone())
            .build()
            .unwrap();

        assert_eq!(
            sink.messages(),
            vec!["DigitalOcean Client configured for URL: https://api.example.com/"]
        );
    }

    #[test]
    fn test_invalid_api_endpoint() {
        let sink = Arc::new(RecordingSink::new());
        let mut config = config();
        config.api_endpoint = "ht!tp://".to_string();

        let err = ClientFactory::new(config)
            .with_sink(sink.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_invalid_template() {
        let mut config = config();
        config.spaces_endpoint = "https://{{.Zone}}.example.com".to_string();
        let err = config.client().unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }));
    }

    #[test]
    fn test_invalid_retry_wait() {
        let mut config = config();
        config.http_retry_wait_min = 10.0;
        config.http_retry_wait_max = 1.0;
        let err = config.client().unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_storage_session_region_case() {
        let client = config().client().unwrap();

        let upper = client.storage_session("NYC3").unwrap();
        let lower = client.storage_session("nyc3").unwrap();
        assert_eq!(upper.endpoint(), "https://nyc3.digitaloceanspaces.com");
        assert_eq!(upper.endpoint(), lower.endpoint());
        assert_eq!(upper.signing_region(), "us-east-1");
        assert_eq!(upper.credentials().secret_key, "secret");
    }

    #[test]
    fn test_storage_session_needs_both_credentials() {
        let mut config = config();
        config.credentials = Credentials::new("DO00EXAMPLE", "");
        let client = config.client().unwrap();

        for region in ["nyc3", "sfo3", "ams3"] {
            assert!(matches!(
                client.storage_session(region),
                Err(Error::CredentialsMissing)
            ));
        }
    }

    #[test]
    fn test_storage_session_bad_render() {
        let mut config = config();
        config.spaces_endpoint = "{{.Region}}".to_string();
        let client = config.client().unwrap();

        let err = client.storage_session("nyc3").unwrap_err();
        assert!(matches!(err, Error::StorageSession { .. }));
    }

    #[test]
    fn test_template_without_region() {
        let mut config = config();
        config.spaces_endpoint = "https://spaces.internal".to_string();
        let client = config.client().unwrap();

        assert!(!client.template().has_region());
        assert_eq!(client.endpoint("nyc3"), client.endpoint("sgp1"));
    }
}
