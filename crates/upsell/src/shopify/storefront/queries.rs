//! GraphQL query definitions for Shopify Storefront API.
//!
//! Identifiers are always sent as variables, never spliced into the query
//! text.

use graphql_client::GraphQLQuery;

// Scalar types for Shopify GraphQL schema
// Must be defined in the same module where GraphQLQuery derive is used
#[allow(clippy::upper_case_acronyms)]
type Decimal = String;
#[allow(clippy::upper_case_acronyms)]
type URL = String;

// Catalog queries
#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/storefront/schema.graphql",
    query_path = "graphql/storefront/queries/catalog.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetComplementaryProducts;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/storefront/schema.graphql",
    query_path = "graphql/storefront/queries/catalog.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetRecommendedProduct;

// Cart queries and mutations
#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/storefront/schema.graphql",
    query_path = "graphql/storefront/queries/cart.graphql",
    response_derives = "Debug, Clone"
)]
pub struct GetCartLines;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/storefront/schema.graphql",
    query_path = "graphql/storefront/queries/cart.graphql",
    response_derives = "Debug, Clone"
)]
pub struct CartLinesAdd;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/storefront/schema.graphql",
    query_path = "graphql/storefront/queries/cart.graphql",
    response_derives = "Debug, Clone"
)]
pub struct CartLinesUpdate;

#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/storefront/schema.graphql",
    query_path = "graphql/storefront/queries/cart.graphql",
    response_derives = "Debug, Clone"
)]
pub struct CartLinesRemove;
