//! CLI module
//!
//! Command-line interface over the client.
//!
//! # Commands
//!
//! - `account` - Show the token's account
//! - `get` - GET any API path
//! - `endpoint` - Render the Spaces endpoint for a region
//! - `list-objects` - List a Spaces bucket

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
