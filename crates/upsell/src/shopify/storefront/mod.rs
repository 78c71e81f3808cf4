//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` for query codegen with `reqwest` 0.13 for HTTP.
//! Caches catalog lookups using `moka` (5-minute TTL).

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use checkout_upsell_core::{
    CartId, CartLine, CartLineChange, CartLineId, ProductId, ProductVariantId,
};
use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::config::{ConfigError, ShopifyStorefrontConfig};
use crate::extension::{CartApi, CatalogApi};
use crate::shopify::ShopifyError;
use crate::shopify::types::{
    COMPLEMENTARY_PRODUCTS_KEY, ProductMetafields, RECOMMENDATION_NAMESPACE, RecommendedProduct,
};

use cache::{CacheKey, CacheValue};
use conversions::{
    check_mutation_payload, convert_cart_lines, convert_metafields, convert_recommended_product,
};
use queries::{
    CartLinesAdd, CartLinesRemove, CartLinesUpdate, GetCartLines, GetComplementaryProducts,
    GetRecommendedProduct, cart_lines_add, cart_lines_remove, cart_lines_update, get_cart_lines,
    get_complementary_products, get_recommended_product,
};

/// Cart lines fetched per cart; checkout carts are far below this.
const CART_LINES_PAGE_SIZE: i64 = 250;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides the catalog lookups and cart mutations the offer needs.
/// Catalog responses are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: url::Url,
    access_token: SecretString,
    cache: Cache<CacheKey, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the store domain does not form a valid endpoint.
    pub fn new(config: &ShopifyStorefrontConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_endpoint(
            config.endpoint()?,
            config.storefront_private_token.clone(),
        ))
    }

    /// Create a client against an explicit GraphQL endpoint.
    #[must_use]
    pub fn with_endpoint(endpoint: url::Url, access_token: SecretString) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint,
                access_token,
                cache,
            }),
        }
    }

    /// Bind this client to one cart.
    #[must_use]
    pub fn cart(&self, cart_id: CartId) -> StorefrontCart {
        StorefrontCart {
            client: self.clone(),
            cart_id,
            last_read: Arc::default(),
        }
    }

    /// Execute a GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            // Private access tokens use a different header than public tokens
            // See: https://shopify.dev/docs/storefronts/headless/building-with-the-storefront-api/getting-started
            .header(
                "Shopify-Storefront-Private-Token",
                self.inner.access_token.expose_secret(),
            )
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::graphql_message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(Into::into).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::graphql_message("No data in response")
        })
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get the complementary-products metafield of the product behind a variant.
    ///
    /// Returns `Ok(None)` when the ID resolves to no node or to a node that is
    /// not a product variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(variant_id = %variant_id))]
    pub async fn get_complementary_products(
        &self,
        variant_id: &ProductVariantId,
    ) -> Result<Option<ProductMetafields>, ShopifyError> {
        let cache_key = CacheKey::Metafields(variant_id.clone());

        if let Some(CacheValue::Metafields(metafields)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for metafields");
            return Ok(metafields);
        }

        let variables = get_complementary_products::Variables {
            id: variant_id.to_string(),
            identifiers: vec![get_complementary_products::HasMetafieldsIdentifier {
                namespace: Some(RECOMMENDATION_NAMESPACE.to_string()),
                key: COMPLEMENTARY_PRODUCTS_KEY.to_string(),
            }],
        };

        let data = self.execute::<GetComplementaryProducts>(variables).await?;

        let metafields = data.node.and_then(convert_metafields);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Metafields(metafields.clone()))
            .await;

        Ok(metafields)
    }

    /// Get a product with its first variant.
    ///
    /// Returns `Ok(None)` when no product has this ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the product data is invalid.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_recommended_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<RecommendedProduct>, ShopifyError> {
        let cache_key = CacheKey::Product(product_id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(product.map(|p| *p));
        }

        let variables = get_recommended_product::Variables {
            id: product_id.to_string(),
        };

        let data = self.execute::<GetRecommendedProduct>(variables).await?;

        let product = data.product.map(convert_recommended_product).transpose()?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Product(product.clone().map(Box::new)),
            )
            .await;

        Ok(product)
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Get the lines of a cart in cart order.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the cart does not exist, or an error
    /// if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn cart_lines(&self, cart_id: &CartId) -> Result<Vec<CartLine>, ShopifyError> {
        let variables = get_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            first: CART_LINES_PAGE_SIZE,
        };

        let data = self.execute::<GetCartLines>(variables).await?;

        data.cart
            .map(convert_cart_lines)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    /// Add units of a variant to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation fails or user errors are returned.
    #[instrument(skip(self), fields(cart_id = %cart_id, merchandise_id = %merchandise_id))]
    pub async fn add_cart_line(
        &self,
        cart_id: &CartId,
        merchandise_id: &ProductVariantId,
        quantity: u32,
    ) -> Result<(), ShopifyError> {
        let variables = cart_lines_add::Variables {
            cart_id: cart_id.to_string(),
            lines: vec![cart_lines_add::CartLineInput {
                merchandise_id: merchandise_id.to_string(),
                quantity: Some(i64::from(quantity)),
            }],
        };

        let data = self.execute::<CartLinesAdd>(variables).await?;
        let cart = check_mutation_payload(data.cart_lines_add, "add to cart")?;
        debug!(cart = %cart.id, total_quantity = cart.total_quantity, "Cart line added");
        Ok(())
    }

    /// Remove units from a cart line whose current quantity is known.
    ///
    /// Lowers the line's quantity, or removes the line outright once it would
    /// reach zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation fails or user errors are returned.
    #[instrument(skip(self, line), fields(cart_id = %cart_id, line_id = %line.id))]
    pub async fn remove_cart_line_units(
        &self,
        cart_id: &CartId,
        line: &CartLine,
        quantity: u32,
    ) -> Result<(), ShopifyError> {
        let cart = if line.quantity > quantity {
            let variables = cart_lines_update::Variables {
                cart_id: cart_id.to_string(),
                lines: vec![cart_lines_update::CartLineUpdateInput {
                    id: line.id.to_string(),
                    quantity: Some(i64::from(line.quantity - quantity)),
                }],
            };
            let data = self.execute::<CartLinesUpdate>(variables).await?;
            check_mutation_payload(data.cart_lines_update, "update cart")?
        } else {
            let variables = cart_lines_remove::Variables {
                cart_id: cart_id.to_string(),
                line_ids: vec![line.id.to_string()],
            };
            let data = self.execute::<CartLinesRemove>(variables).await?;
            check_mutation_payload(data.cart_lines_remove, "remove from cart")?
        };

        debug!(cart = %cart.id, total_quantity = cart.total_quantity, "Cart line units removed");
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for StorefrontClient {
    async fn complementary_products(
        &self,
        variant_id: &ProductVariantId,
    ) -> Result<Option<ProductMetafields>, ShopifyError> {
        self.get_complementary_products(variant_id).await
    }

    async fn recommended_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<RecommendedProduct>, ShopifyError> {
        self.get_recommended_product(product_id).await
    }
}

// =============================================================================
// StorefrontCart
// =============================================================================

/// A Storefront client bound to a single cart.
///
/// The lines from the latest read are kept until the next removal, so a
/// deselect that just looked up its line does not read the cart again.
#[derive(Clone)]
pub struct StorefrontCart {
    client: StorefrontClient,
    cart_id: CartId,
    last_read: Arc<Mutex<Option<Vec<CartLine>>>>,
}

impl StorefrontCart {
    /// The cart this handle mutates.
    #[must_use]
    pub const fn cart_id(&self) -> &CartId {
        &self.cart_id
    }

    /// Current state of a line, from the latest read if there is one.
    async fn current_line(&self, line_id: &CartLineId) -> Result<Option<CartLine>, ShopifyError> {
        let lines = match self.last_read.lock().await.take() {
            Some(lines) => lines,
            None => self.client.cart_lines(&self.cart_id).await?,
        };
        Ok(lines.into_iter().find(|line| &line.id == line_id))
    }
}

#[async_trait]
impl CartApi for StorefrontCart {
    async fn lines(&self) -> Result<Vec<CartLine>, ShopifyError> {
        let lines = self.client.cart_lines(&self.cart_id).await?;
        *self.last_read.lock().await = Some(lines.clone());
        Ok(lines)
    }

    async fn apply(&self, change: CartLineChange) -> Result<(), ShopifyError> {
        match change {
            CartLineChange::AddCartLine {
                merchandise_id,
                quantity,
            } => {
                self.client
                    .add_cart_line(&self.cart_id, &merchandise_id, quantity)
                    .await
            }
            CartLineChange::RemoveCartLine { id, quantity } => {
                let Some(line) = self.current_line(&id).await? else {
                    debug!(line_id = %id, "Cart line already gone");
                    return Ok(());
                };
                self.client
                    .remove_cart_line_units(&self.cart_id, &line, quantity)
                    .await
            }
        }
    }
}
