//! Shopify Admin API client.
//!
//! # Security
//!
//! This module holds the Admin API access token. It can read and write every
//! customer in the store; the token is never logged.
//!
//! # Architecture
//!
//! - REST for the customer search and create calls
//! - `graphql-client` generated types for the metafield mutation, with all
//!   values bound as variables
//! - Only the search is retried (bounded, jittered); create and mutate are
//!   sent once
//!
//! # Example
//!
//! ```rust,ignore
//! use archetype_sync::shopify::ShopifyClient;
//!
//! let client = ShopifyClient::new(&config.shopify)?;
//!
//! let matches = client.search_customers_by_email(&email).await?;
//! let result = client.set_metafield(&matches[0].id, &input).await?;
//! ```

mod admin;
pub mod types;

pub use admin::ShopifyClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request failed inside the retry middleware.
    #[error("HTTP error after retries: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Shopify answered with a non-success status.
    #[error("Shopify returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body was not the JSON we expected.
    #[error("Unexpected response body ({source}): {body}")]
    Parse {
        /// Underlying JSON error.
        source: serde_json::Error,
        /// Raw response body.
        body: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Customer create succeeded but carried no usable identifier.
    #[error("Customer create response contained no customer id: {0}")]
    MissingCustomerId(String),
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}
