//! Cache types for Storefront API catalog responses.

use checkout_upsell_core::{ProductId, ProductVariantId};

use crate::shopify::types::{ProductMetafields, RecommendedProduct};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Metafields(ProductVariantId),
    Product(ProductId),
}

/// Cached value types.
///
/// `None` payloads record a confirmed miss (no node / no product) so repeated
/// mounts for the same cart item don't hammer the API.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Metafields(Option<ProductMetafields>),
    Product(Option<Box<RecommendedProduct>>),
}
