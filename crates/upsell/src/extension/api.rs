//! Host interfaces the offer consumes.
//!
//! The catalog and the cart are external collaborators. Production wires in
//! the Storefront API client; tests wire in in-memory fakes.

use async_trait::async_trait;
use checkout_upsell_core::{CartLine, CartLineChange, ProductId, ProductVariantId};

use crate::shopify::{ProductMetafields, RecommendedProduct, ShopifyError};

/// Read access to product data.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Complementary-products metafield of the product behind a variant.
    ///
    /// `Ok(None)` means the variant resolved to no node.
    async fn complementary_products(
        &self,
        variant_id: &ProductVariantId,
    ) -> Result<Option<ProductMetafields>, ShopifyError>;

    /// Product title, featured image and first variant.
    ///
    /// `Ok(None)` means no product has this ID.
    async fn recommended_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<RecommendedProduct>, ShopifyError>;
}

/// Read and write access to one shopper's cart.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Current lines in cart order.
    async fn lines(&self) -> Result<Vec<CartLine>, ShopifyError>;

    /// Apply a single line change.
    async fn apply(&self, change: CartLineChange) -> Result<(), ShopifyError>;
}
