//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::client::{ClientFactory, CombinedClient};
use crate::config::Config;
use crate::events::{self, SharedSink, TracingSink};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Account => self.get("/v2/account").await,
            Commands::Get { path } => self.get(path).await,
            Commands::Endpoint { region } => self.endpoint(region),
            Commands::ListObjects {
                region,
                bucket,
                prefix,
            } => self.list_objects(region, bucket, prefix.as_deref()).await,
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn get(&self, path: &str) -> Result<()> {
        let client = self.client()?;
        let body: Value = client
            .api_client()
            .get_json(path)
            .await
            .with_context(|| format!("GET {path} failed"))?;

        self.output_message(&body);
        Ok(())
    }

    fn endpoint(&self, region: &str) -> Result<()> {
        let client = self.client()?;
        self.output_message(&json!({
            "region": region.to_lowercase(),
            "endpoint": client.endpoint(region),
        }));
        Ok(())
    }

    async fn list_objects(&self, region: &str, bucket: &str, prefix: Option<&str>) -> Result<()> {
        let client = self.client()?;
        let session = client
            .storage_session(region)
            .with_context(|| format!("Failed to open storage session for {region}"))?;
        let bucket = session.bucket(bucket)?;

        let objects = bucket
            .list(prefix)
            .await
            .with_context(|| format!("Failed to list bucket {}", bucket.name()))?;

        let listing: Vec<Value> = objects
            .iter()
            .map(|meta| {
                json!({
                    "key": meta.location.to_string(),
                    "size": meta.size,
                    "last_modified": meta.last_modified.to_rfc3339(),
                    "e_tag": meta.e_tag,
                })
            })
            .collect();

        self.output_message(&json!({
            "bucket": bucket.name(),
            "endpoint": session.endpoint(),
            "count": listing.len(),
            "objects": listing,
        }));
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn load_config(&self) -> Result<Config> {
        match &self.cli.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display())),
            None => Config::from_env().context("Failed to load config from environment"),
        }
    }

    fn client(&self) -> Result<CombinedClient> {
        let config = self.load_config()?;
        let sink: SharedSink = if self.cli.verbose {
            Arc::new(TracingSink)
        } else {
            events::noop()
        };

        ClientFactory::new(config)
            .with_sink(sink)
            .build()
            .context("Failed to build client")
    }

    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
