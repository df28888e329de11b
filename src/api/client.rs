//! API client bound to a base URL and a transport chain
//!
//! Builds JSON requests relative to the base URL, sends them through the
//! layered transport, and turns non-2xx responses into [`Error::Api`].

use super::rate::Rate;
use crate::error::{Error, Result};
use crate::http::{Capability, SharedTransport};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Request, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::debug;
use url::Url;

const MEDIA_TYPE: &str = "application/json";

/// Error body returned by the API
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    request_id: Option<String>,
}

/// Client for the provider REST API
#[derive(Clone)]
pub struct ApiClient {
    transport: SharedTransport,
    base_url: Url,
    user_agent: String,
    rate: Arc<RwLock<Option<Rate>>>,
}

impl ApiClient {
    pub fn new(base_url: Url, transport: SharedTransport, user_agent: impl Into<String>) -> Self {
        Self {
            transport,
            base_url,
            user_agent: user_agent.into(),
            rate: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Stages of the transport chain, innermost first
    pub fn capabilities(&self) -> Vec<Capability> {
        self.transport.capabilities()
    }

    /// Quota reported by the most recent response
    pub fn rate(&self) -> Option<Rate> {
        self.rate.read().ok().and_then(|rate| *rate)
    }

    /// Build a request for a path relative to the base URL
    pub fn new_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Request> {
        let url = self
            .base_url
            .join(path)
            .map_err(|source| Error::InvalidEndpoint {
                endpoint: path.to_string(),
                source,
            })?;

        let mut request = Request::new(method, url);
        let headers = request.headers_mut();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|_| Error::Other(format!("invalid user agent '{}'", self.user_agent)))?,
        );

        if let Some(body) = body {
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
            *request.body_mut() = Some(serde_json::to_vec(body)?.into());
        }

        Ok(request)
    }

    /// Send a request and check the status
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.transport.send(request).await?;
        if let Some(rate) = Rate::from_headers(response.headers()) {
            if let Ok(mut current) = self.rate.write() {
                *current = Some(rate);
            }
        }

        let response = check_response(response).await?;
        debug!("Request succeeded: {} {}", method, url);
        Ok(response)
    }

    /// Build and send a request
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let request = self.new_request(method, path, body)?;
        self.execute(request).await
    }

    /// GET a path and parse the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request::<()>(Method::GET, path, None).await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body and parse the JSON response
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.request(Method::POST, path, Some(body)).await?;
        Ok(response.json().await?)
    }

    /// DELETE a path, discarding the body
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("capabilities", &self.capabilities())
            .finish_non_exhaustive()
    }
}

/// Pass 2xx through, map everything else to [`Error::Api`]
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let header_request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let message = if !body.message.is_empty() {
        body.message
    } else if !text.trim().is_empty() {
        text
    } else {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    };

    Err(Error::Api {
        status: status.as_u16(),
        message,
        request_id: body.request_id.or(header_request_id),
    })
}
