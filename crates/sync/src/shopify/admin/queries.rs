//! GraphQL operation definitions for the Shopify Admin API.
//!
//! Uses `graphql_client` to generate type-safe Rust code from the documents
//! in `graphql/admin/queries/`. Values are always bound as variables.

use graphql_client::GraphQLQuery;

// =============================================================================
// Metafield operations
// =============================================================================

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/metafields.graphql",
    response_derives = "Debug, Clone",
    variables_derives = "Debug, Clone"
)]
pub struct MetafieldsSet;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/admin/schema.graphql",
    query_path = "graphql/admin/queries/metafields.graphql",
    response_derives = "Debug, Clone",
    variables_derives = "Debug, Clone"
)]
pub struct GetCustomerMetafield;
