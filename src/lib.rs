// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # ocean-client
//!
//! Authenticated, rate-limit-aware client for the DigitalOcean API, with
//! per-region Spaces (S3-compatible) sessions.
//!
//! ## Features
//!
//! - **Rate-Limit Aware Retries**: 429 responses wait until `RateLimit-Reset`,
//!   other failures back off exponentially, both bounded by the configured max
//! - **Ordered Transport Chain**: throttle, retry, bearer auth and logging
//!   stages whose nesting is checked when the chain is built
//! - **Spaces Sessions**: endpoint rendered from a `{{.Region}}` template,
//!   fixed signing region, static keys
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ocean_client::{Config, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_env()?;
//!     let client = config.client()?;
//!
//!     let account: serde_json::Value = client.api_client().get_json("/v2/account").await?;
//!     println!("{account}");
//!
//!     let session = client.storage_session("nyc3")?;
//!     let objects = session.bucket("assets")?.list(None).await?;
//!     println!("{} objects", objects.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       CombinedClient                         │
//! │   api_client() -> ApiClient    storage_session(region)       │
//! └──────────────────────────────────────────────────────────────┘
//!                 │                              │
//!   Logs ─ Authenticates ─ Retries ─ Throttles   EndpointTemplate
//!                 │                              │
//!           reqwest::Client              object_store (S3)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Client configuration
pub mod config;

/// Construction and backoff events
pub mod events;

/// Spaces endpoint templates
pub mod template;

/// Bearer token authentication
pub mod auth;

/// Transport chain with retry, backoff and rate limiting
pub mod http;

/// API request helper
pub mod api;

/// Spaces storage sessions
pub mod storage;

/// Client factory and combined handle
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use api::{ApiClient, Rate};
pub use client::{ClientFactory, CombinedClient};
pub use config::{Config, ConfigBuilder, Credentials};
pub use error::{Error, Result};
pub use events::{ClientEvent, EventSink, RecordingSink, SharedSink, TracingSink};
pub use storage::{Bucket, StorageSession};
pub use template::EndpointTemplate;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
