//! Shopify Admin API client with access-token authentication.
//!
//! Wraps two `reqwest` clients that share timeouts: a retrying one for
//! idempotent reads and a plain one for writes.

use std::sync::Arc;
use std::time::Duration;

use graphql_client::GraphQLQuery;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};

use crate::config::ShopifyConfig;

use super::{GraphQLError, ShopifyError};

mod conversions;
mod customers;
mod metafields;
pub mod queries;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(200);
const MAX_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Shopify Admin API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    /// Plain client, used for writes (never retried)
    client: reqwest::Client,
    /// Same client behind the retry middleware, used for the customer search
    retrying: ClientWithMiddleware,
    /// `{origin}/admin/api/{version}`
    api_base: String,
    access_token: SecretString,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("api_base", &self.inner.api_base)
            .finish_non_exhaustive()
    }
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

impl ShopifyClient {
    /// Create a new Admin API client.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the underlying HTTP client cannot be
    /// built (e.g., TLS backend initialization fails).
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .default_headers(headers)
            .user_agent(concat!("archetype-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Exponential backoff with full jitter, bounded by the configured count
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(MIN_RETRY_INTERVAL, MAX_RETRY_INTERVAL)
            .build_with_max_retries(config.search_max_retries);

        let retrying = ClientBuilder::new(client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        tracing::debug!(
            api_base = %config.admin_api_base(),
            search_max_retries = config.search_max_retries,
            timeout_ms = u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX),
            "Shopify client initialized"
        );

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                retrying,
                api_base: config.admin_api_base(),
                access_token: config.access_token.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.inner.api_base, path.trim_start_matches('/'))
    }

    fn access_token(&self) -> &str {
        self.inner.access_token.expose_secret()
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL operation. Never retried.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(self.endpoint("graphql.json"))
            .header(ACCESS_TOKEN_HEADER, self.access_token())
            .json(&body)
            .send()
            .await?;

        let graphql_response: GraphQLResponse<Q::ResponseData> = read_json(response).await?;

        // Check for GraphQL errors
        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    path: e.path,
                })
                .collect();
            return Err(ShopifyError::GraphQL(converted_errors));
        }

        graphql_response.data.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                path: vec![],
            }])
        })
    }
}

/// Check the status of a Shopify response and decode its JSON body.
///
/// Non-success statuses and undecodable bodies keep the raw body text so
/// callers can surface it for diagnosis.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ShopifyError> {
    let status = response.status();

    // Check for rate limiting
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        // Shopify sends fractional seconds ("2.0")
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map_or(2, |secs| secs.ceil() as u64);
        return Err(ShopifyError::RateLimited(retry_after));
    }

    let body = response.text().await?;

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ShopifyError::Unauthorized(format!("HTTP {}: {body}", status.as_u16())));
    }

    if !status.is_success() {
        return Err(ShopifyError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| ShopifyError::Parse { source, body })
}
