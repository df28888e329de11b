//! Transport chain builder
//!
//! Stages are listed innermost first and each declares a [`Capability`].
//! The order is checked when the chain is built:
//!
//! ```text
//!   Logs            outermost: sees the authenticated request once
//!   Authenticates   stamps the bearer header before any replay
//!   Retries         replays the already authenticated request
//!   Throttles       waits for a token before every attempt
//!   base transport
//! ```
//!
//! Putting auth inside retry, or logging inside auth, is rejected.

use super::backoff::Backoff;
use super::logging::LoggingTransport;
use super::rate_limit::{RateLimiter, ThrottleTransport};
use super::retry::{RetryConfig, RetryTransport};
use super::transport::{SharedTransport, Transport};
use crate::auth::{AuthTransport, SharedTokenSource};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// What a stage does, in the only order stages may be nested
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Throttles,
    Retries,
    Authenticates,
    Logs,
}

/// One layer of the chain
pub enum Stage {
    Throttle(RateLimiter),
    Retry {
        config: RetryConfig,
        backoff: Arc<dyn Backoff>,
    },
    Auth(SharedTokenSource),
    Log { service: String },
}

impl Stage {
    pub fn capability(&self) -> Capability {
        match self {
            Stage::Throttle(_) => Capability::Throttles,
            Stage::Retry { .. } => Capability::Retries,
            Stage::Auth(_) => Capability::Authenticates,
            Stage::Log { .. } => Capability::Logs,
        }
    }

    fn wrap(self, inner: SharedTransport) -> SharedTransport {
        match self {
            Stage::Throttle(limiter) => Arc::new(ThrottleTransport::new(limiter, inner)),
            Stage::Retry { config, backoff } => Arc::new(RetryTransport::new(inner, config, backoff)),
            Stage::Auth(source) => Arc::new(AuthTransport::new(source, inner)),
            Stage::Log { service } => Arc::new(LoggingTransport::new(service, inner)),
        }
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Retry { config, .. } => f.debug_struct("Retry").field("config", config).finish_non_exhaustive(),
            Stage::Log { service } => f.debug_struct("Log").field("service", service).finish(),
            other => write!(f, "{:?}", other.capability()),
        }
    }
}

/// Ordered list of stages, innermost first
#[derive(Debug, Default)]
pub struct TransportChain {
    stages: Vec<Stage>,
}

impl TransportChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next stage outward
    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    #[must_use]
    pub fn throttle(self, limiter: RateLimiter) -> Self {
        self.stage(Stage::Throttle(limiter))
    }

    #[must_use]
    pub fn retry(self, config: RetryConfig, backoff: Arc<dyn Backoff>) -> Self {
        self.stage(Stage::Retry { config, backoff })
    }

    #[must_use]
    pub fn authenticate(self, source: SharedTokenSource) -> Self {
        self.stage(Stage::Auth(source))
    }

    #[must_use]
    pub fn log(self, service: impl Into<String>) -> Self {
        self.stage(Stage::Log {
            service: service.into(),
        })
    }

    /// Capabilities in declaration order
    pub fn capabilities(&self) -> Vec<Capability> {
        self.stages.iter().map(Stage::capability).collect()
    }

    /// Check that every stage wraps only stages that must run inside it
    pub fn validate(&self) -> Result<()> {
        for pair in self.capabilities().windows(2) {
            let (inner, outer) = (pair[0], pair[1]);
            if inner == outer {
                return Err(Error::chain(format!("{outer:?} stage declared twice")));
            }
            if outer < inner {
                return Err(Error::chain(format!(
                    "{outer:?} stage cannot wrap {inner:?}; stages nest as \
                     Throttles -> Retries -> Authenticates -> Logs from the inside out"
                )));
            }
        }
        Ok(())
    }

    /// Validate and wrap `base` in every stage
    pub fn build(self, base: SharedTransport) -> Result<LayeredTransport> {
        self.validate()?;
        let capabilities = self.capabilities();
        let outer = self
            .stages
            .into_iter()
            .fold(base, |inner, stage| stage.wrap(inner));
        Ok(LayeredTransport {
            outer,
            capabilities,
        })
    }
}

/// A built chain
pub struct LayeredTransport {
    outer: SharedTransport,
    capabilities: Vec<Capability>,
}

#[async_trait]
impl Transport for LayeredTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        self.outer.send(request).await
    }

    fn capabilities(&self) -> Vec<Capability> {
        self.capabilities.clone()
    }
}

impl fmt::Debug for LayeredTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredTransport")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
