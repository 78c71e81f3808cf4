//! Display projection of a recommended product.

use serde::{Deserialize, Serialize};

use super::id::ProductVariantId;
use super::price::Price;

/// What the offer shows for the recommended product's first variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSummary {
    /// Product title.
    pub product_title: String,
    /// Variant title (e.g., "Large / Blue").
    pub variant_title: String,
    /// Variant to add to the cart.
    pub variant_id: ProductVariantId,
    /// SKU code.
    pub sku: Option<String>,
    /// Current price of the variant.
    pub price: Price,
    /// Image source, variant image first, featured image second.
    pub image_url: Option<String>,
    /// Alt text of the same image `image_url` came from.
    pub image_alt_text: Option<String>,
}
