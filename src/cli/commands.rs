//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DigitalOcean API and Spaces client
#[derive(Parser, Debug)]
#[command(name = "ocean-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON); environment variables are used otherwise
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Log rate-limit waits and client construction
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the account the token belongs to
    Account,

    /// GET an API path and print the JSON body
    Get {
        /// Path relative to the API base URL, e.g. /v2/regions
        path: String,
    },

    /// Print the Spaces endpoint for a region
    Endpoint {
        /// Region slug, e.g. nyc3
        region: String,
    },

    /// List objects in a Spaces bucket
    ListObjects {
        /// Region slug
        #[arg(short, long)]
        region: String,

        /// Bucket name
        #[arg(short, long)]
        bucket: String,

        /// Only list keys under this prefix
        #[arg(short, long)]
        prefix: Option<String>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON, one document per line
    Json,
    /// Indented JSON
    Pretty,
}
