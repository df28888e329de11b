//! S3-compatible storage session for Spaces
//!
//! A session is only the endpoint, signing region and key pair. Object
//! stores are opened per bucket from it.

use crate::config::Credentials;
use crate::error::{Error, Result};
use futures::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Region used for request signing. Spaces ignores it, S3 signing needs one.
pub const SIGNING_REGION: &str = "us-east-1";

/// Endpoint, signing region and static credentials for one Spaces region
#[derive(Clone)]
pub struct StorageSession {
    endpoint: Url,
    credentials: Credentials,
}

impl StorageSession {
    /// Create a session for a rendered endpoint
    pub fn new(endpoint: &str, credentials: Credentials) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::storage(format!("invalid endpoint '{endpoint}': {e}")))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::storage(format!(
                "unsupported endpoint scheme '{}'",
                endpoint.scheme()
            )));
        }
        if endpoint.host_str().map_or(true, str::is_empty) {
            return Err(Error::storage(format!("endpoint '{endpoint}' has no host")));
        }

        Ok(Self {
            endpoint,
            credentials,
        })
    }

    /// Endpoint override, without a trailing slash
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str().trim_end_matches('/')
    }

    pub fn signing_region(&self) -> &str {
        SIGNING_REGION
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Open an object store for a bucket
    pub fn bucket(&self, name: &str) -> Result<Bucket> {
        if name.is_empty() {
            return Err(Error::storage("bucket name must not be empty"));
        }

        let store = AmazonS3Builder::new()
            .with_region(SIGNING_REGION)
            .with_endpoint(self.endpoint())
            .with_allow_http(self.endpoint.scheme() == "http")
            .with_access_key_id(&self.credentials.access_id)
            .with_secret_access_key(&self.credentials.secret_key)
            .with_bucket_name(name)
            .build()
            .map_err(|e| Error::storage(format!("Failed to create client for bucket {name}: {e}")))?;

        debug!("Opened bucket {} at {}", name, self.endpoint());
        Ok(Bucket {
            name: name.to_string(),
            store: Arc::new(store),
        })
    }
}

impl std::fmt::Debug for StorageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSession")
            .field("endpoint", &self.endpoint())
            .field("signing_region", &SIGNING_REGION)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Object store for a single bucket
#[derive(Debug, Clone)]
pub struct Bucket {
    name: String,
    store: Arc<AmazonS3>,
}

impl Bucket {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// List every object under a prefix
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<ObjectMeta>> {
        let prefix = prefix.filter(|p| !p.is_empty()).map(ObjectPath::from);
        let objects: Vec<ObjectMeta> = self.store.list(prefix.as_ref()).try_collect().await?;
        Ok(objects)
    }
}
