//! Domain types for the Storefront API responses the offer consumes.
//!
//! These types provide a clean API separate from the raw GraphQL response
//! shapes in `storefront::queries`.

use checkout_upsell_core::{Price, ProductId, ProductVariantId};
use serde::{Deserialize, Serialize};

/// Namespace of Shopify's Search & Discovery product recommendations.
pub const RECOMMENDATION_NAMESPACE: &str = "shopify--discovery--product_recommendation";

/// Metafield key holding complementary product references.
pub const COMPLEMENTARY_PRODUCTS_KEY: &str = "complementary_products";

// =============================================================================
// Image Types
// =============================================================================

/// Product or variant image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Shopify image ID.
    pub id: Option<String>,
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
}

// =============================================================================
// Metafield Types
// =============================================================================

/// A namespaced key/value annotation on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    /// Metafield key.
    pub key: String,
    /// Metafield type (e.g., `list.product_reference`).
    pub kind: String,
    /// Raw value; JSON-encoded for list types.
    pub value: String,
}

/// Metafields requested for the product behind a variant, in request order.
///
/// Entries are `None` where the product has no value for that identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetafields {
    /// Requested metafields.
    pub metafields: Vec<Option<Metafield>>,
}

impl ProductMetafields {
    /// Value of the first requested metafield, if present.
    #[must_use]
    pub fn first_value(&self) -> Option<&str> {
        self.metafields
            .first()
            .and_then(Option::as_ref)
            .map(|m| m.value.as_str())
    }
}

// =============================================================================
// Product Types
// =============================================================================

/// A product variant as needed by the offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID.
    pub id: ProductVariantId,
    /// SKU code.
    pub sku: Option<String>,
    /// Variant title (combination of option values).
    pub title: String,
    /// Current price.
    pub price: Price,
    /// Variant image.
    pub image: Option<Image>,
}

/// A recommended product with its first variant(s).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedProduct {
    /// Product ID.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// Featured image.
    pub featured_image: Option<Image>,
    /// Variants, first one first.
    pub variants: Vec<ProductVariant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metafield(value: &str) -> Metafield {
        Metafield {
            key: COMPLEMENTARY_PRODUCTS_KEY.to_string(),
            kind: "list.product_reference".to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_first_value_present() {
        let fields = ProductMetafields {
            metafields: vec![Some(metafield("[\"a\"]")), Some(metafield("[\"b\"]"))],
        };
        assert_eq!(fields.first_value(), Some("[\"a\"]"));
    }

    #[test]
    fn test_first_value_null_entry() {
        let fields = ProductMetafields {
            metafields: vec![None, Some(metafield("[\"b\"]"))],
        };
        assert_eq!(fields.first_value(), None);
        assert_eq!(ProductMetafields::default().first_value(), None);
    }
}
