//! Metafield writes and reads through the GraphQL Admin API.

use archetype_sync_core::{CustomerId, MetafieldKey};
use graphql_client::GraphQLQuery;
use tracing::instrument;

use super::{
    ShopifyClient,
    conversions::{convert_customer_metafield, convert_metafields_set},
    queries::{GetCustomerMetafield, MetafieldsSet, get_customer_metafield, metafields_set},
};
use crate::shopify::ShopifyError;
use crate::shopify::types::{Metafield, MetafieldInput, MetafieldsSetResult};

/// Build the `metafieldsSet` variables for one customer metafield.
pub(super) fn metafields_set_variables(
    owner: &CustomerId,
    input: &MetafieldInput,
) -> metafields_set::Variables {
    metafields_set::Variables {
        metafields: vec![metafields_set::MetafieldsSetInput {
            owner_id: owner.to_gid(),
            namespace: Some(input.target.namespace().to_string()),
            key: input.target.key().to_string(),
            value: input.value.clone(),
            type_: Some(input.kind.as_str().to_string()),
            compare_digest: None,
        }],
    }
}

impl ShopifyClient {
    /// Set (create or overwrite) one metafield on a customer.
    ///
    /// `metafieldsSet` replaces any existing value for the same
    /// namespace/key, so repeating a sync converges on the latest value.
    /// User errors are returned in the result, not as `Err`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, Shopify answers with a
    /// non-success status, the response carries top-level GraphQL errors, or
    /// the mutation payload is missing.
    #[instrument(skip(self, input), fields(customer_id = %owner, metafield = %input.target))]
    pub async fn set_metafield(
        &self,
        owner: &CustomerId,
        input: &MetafieldInput,
    ) -> Result<MetafieldsSetResult, ShopifyError> {
        let variables = metafields_set_variables(owner, input);

        let response: <MetafieldsSet as GraphQLQuery>::ResponseData =
            self.execute::<MetafieldsSet>(variables).await?;

        let payload = response.metafields_set.ok_or_else(|| {
            ShopifyError::GraphQL(vec![crate::shopify::GraphQLError {
                message: "No metafieldsSet payload in response".to_string(),
                path: vec![],
            }])
        })?;

        Ok(convert_metafields_set(payload))
    }

    /// Read a customer's metafield.
    ///
    /// Returns `None` if the customer or the metafield does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, target), fields(customer_id = %owner, metafield = %target))]
    pub async fn get_customer_metafield(
        &self,
        owner: &CustomerId,
        target: &MetafieldKey,
    ) -> Result<Option<Metafield>, ShopifyError> {
        let variables = get_customer_metafield::Variables {
            id: owner.to_gid(),
            namespace: target.namespace().to_string(),
            key: target.key().to_string(),
        };

        let response = self.execute::<GetCustomerMetafield>(variables).await?;

        Ok(response
            .customer
            .and_then(|customer| customer.metafield)
            .map(convert_customer_metafield))
    }
}
