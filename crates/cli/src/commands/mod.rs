//! CLI subcommands.

pub mod config;
pub mod sync;

use archetype_sync::{ConfigError, SyncError, shopify::ShopifyError};
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Environment is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Shopify call failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// The sync pipeline rejected the request or failed.
    #[error("{0}")]
    Sync(#[from] SyncError),

    /// Output could not be rendered.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// Email argument is not a valid address.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
}

/// Write a JSON document to stdout.
#[allow(clippy::print_stdout)]
fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
