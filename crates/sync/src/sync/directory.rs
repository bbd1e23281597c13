//! Seam between the sync pipeline and the customer platform.

use archetype_sync_core::{CustomerId, Email};
use async_trait::async_trait;

use crate::shopify::{
    CustomerRecord, MetafieldInput, MetafieldsSetResult, NewCustomer, ShopifyClient, ShopifyError,
};

/// The customer operations the sync pipeline needs.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Customers whose email matches exactly, in platform order.
    async fn find_customers_by_email(
        &self,
        email: &Email,
    ) -> Result<Vec<CustomerRecord>, ShopifyError>;

    /// Create a customer. Must not be retried by implementations.
    async fn create_customer(&self, customer: &NewCustomer) -> Result<CustomerRecord, ShopifyError>;

    /// Set one metafield on a customer.
    async fn set_metafield(
        &self,
        owner: &CustomerId,
        input: &MetafieldInput,
    ) -> Result<MetafieldsSetResult, ShopifyError>;
}

#[async_trait]
impl CustomerDirectory for ShopifyClient {
    async fn find_customers_by_email(
        &self,
        email: &Email,
    ) -> Result<Vec<CustomerRecord>, ShopifyError> {
        self.search_customers_by_email(email).await
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<CustomerRecord, ShopifyError> {
        Self::create_customer(self, customer).await
    }

    async fn set_metafield(
        &self,
        owner: &CustomerId,
        input: &MetafieldInput,
    ) -> Result<MetafieldsSetResult, ShopifyError> {
        Self::set_metafield(self, owner, input).await
    }
}
