//! Error types for ocean-client
//!
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Transient API failures never show up as their own variant: the retry
//! transport absorbs them and, once retries are exhausted, hands back the
//! last outcome unchanged.

use thiserror::Error;

/// The main error type for ocean-client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Construction Errors
    // ============================================================================
    #[error("Invalid API endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unable to parse spaces_endpoint '{template}' as template: {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("Invalid transport chain: {message}")]
    InvalidTransportChain { message: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Spaces credentials not configured")]
    CredentialsMissing,

    #[error("Failed to create storage session: {message}")]
    StorageSession { message: String },

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid template error
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create an invalid transport chain error
    pub fn chain(message: impl Into<String>) -> Self {
        Self::InvalidTransportChain {
            message: message.into(),
        }
    }

    /// Create a storage session error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageSession {
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an API error without a request id
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            request_id: None,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_builder() && !e.is_redirect(),
            Error::Api { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable.
///
/// Rate limiting and every server error qualify, except 501 which will
/// not change on a second attempt.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    status == 429 || (status >= 500 && status != 501)
}

/// Result type alias for ocean-client
pub type Result<T> = std::result::Result<T, Error>;
