//! Customer lookup and creation through the REST Admin API.

use archetype_sync_core::{CustomerId, Email};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ACCESS_TOKEN_HEADER, ShopifyClient, read_json};
use crate::shopify::ShopifyError;
use crate::shopify::types::{CustomerRecord, NewCustomer};

/// `GET customers/search.json` response.
#[derive(Debug, Deserialize)]
struct CustomerSearchResponse {
    customers: Vec<CustomerRecord>,
}

/// `POST customers.json` request body.
#[derive(Debug, Serialize)]
struct CustomerCreateRequest<'a> {
    customer: CustomerCreateBody<'a>,
}

#[derive(Debug, Serialize)]
struct CustomerCreateBody<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    verified_email: bool,
    accepts_marketing: bool,
}

/// `POST customers.json` response. Every field is optional so a body without
/// an id is reported as such rather than as a decode error.
#[derive(Debug, Deserialize)]
struct CustomerCreateResponse {
    customer: Option<CreatedCustomer>,
}

#[derive(Debug, Deserialize)]
struct CreatedCustomer {
    id: Option<CustomerId>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
}

impl<'a> From<&'a NewCustomer> for CustomerCreateRequest<'a> {
    fn from(input: &'a NewCustomer) -> Self {
        Self {
            customer: CustomerCreateBody {
                email: input.email.as_str(),
                first_name: input.first_name.as_deref(),
                last_name: input.last_name.as_deref(),
                phone: input.phone.as_deref(),
                verified_email: true,
                accepts_marketing: true,
            },
        }
    }
}

impl ShopifyClient {
    /// Search customers by exact email.
    ///
    /// Sent through the retrying client: transient failures (connection
    /// errors, timeouts, 5xx, 429) are retried with jittered backoff.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after retries, Shopify answers
    /// with a non-success status, or the body is not a customer list.
    #[instrument(skip(self, email), fields(email = %email))]
    pub async fn search_customers_by_email(
        &self,
        email: &Email,
    ) -> Result<Vec<CustomerRecord>, ShopifyError> {
        let query = email_query(email);

        let response = self
            .inner
            .retrying
            .get(self.endpoint("customers/search.json"))
            .header(ACCESS_TOKEN_HEADER, self.access_token())
            .query(&[("query", query.as_str())])
            .send()
            .await?;

        let result: CustomerSearchResponse = read_json(response).await?;

        tracing::debug!(matches = result.customers.len(), "Customer search complete");

        Ok(result.customers)
    }

    /// Create a customer with verified email and marketing consent.
    ///
    /// Never retried: a retry after a lost response could create a duplicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, Shopify rejects the customer
    /// (e.g., 422 for a taken phone number), or the response has no id.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_customer(
        &self,
        input: &NewCustomer,
    ) -> Result<CustomerRecord, ShopifyError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("customers.json"))
            .header(ACCESS_TOKEN_HEADER, self.access_token())
            .json(&CustomerCreateRequest::from(input))
            .send()
            .await?;

        let result: CustomerCreateResponse = read_json(response).await?;

        let customer = result
            .customer
            .ok_or_else(|| ShopifyError::MissingCustomerId("no customer object".to_string()))?;

        let id = customer
            .id
            .ok_or_else(|| ShopifyError::MissingCustomerId("customer.id absent".to_string()))?;

        tracing::info!(customer_id = %id, "Customer created");

        Ok(CustomerRecord {
            id,
            email: customer.email,
            first_name: customer.first_name,
            last_name: customer.last_name,
            phone: customer.phone,
        })
    }
}

/// Search syntax for an exact email match.
fn email_query(email: &Email) -> String {
    format!("email:{email}")
}
