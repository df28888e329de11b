//! Token sources and the authenticating transport stage
//!
//! The stage stamps `Authorization` on the request before handing it to the
//! retry stage, so every replayed attempt carries the same header.

use super::types::Token;
use crate::error::{Error, Result};
use crate::http::{SharedTransport, Transport};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response};
use std::sync::Arc;

/// Hands out the token to put on the next request
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<Token>;
}

/// Shared handle to a token source
pub type SharedTokenSource = Arc<dyn TokenSource>;

/// Always returns the same token
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: Token,
}

impl StaticTokenSource {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            token: Token::bearer(access_token),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<Token> {
        Ok(self.token.clone())
    }
}

/// Transport stage that adds the `Authorization` header
pub struct AuthTransport {
    source: SharedTokenSource,
    inner: SharedTransport,
}

impl AuthTransport {
    pub fn new(source: SharedTokenSource, inner: SharedTransport) -> Self {
        Self { source, inner }
    }
}

/// Build the header value, marked sensitive so it is never printed
pub fn authorization_header(token: &Token) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&token.authorization_value())
        .map_err(|_| Error::auth("access token contains characters not allowed in a header"))?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl Transport for AuthTransport {
    async fn send(&self, mut request: Request) -> Result<Response> {
        let token = self.source.token().await?;
        request
            .headers_mut()
            .insert(AUTHORIZATION, authorization_header(&token)?);
        self.inner.send(request).await
    }
}

impl std::fmt::Debug for AuthTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTransport").finish_non_exhaustive()
    }
}
