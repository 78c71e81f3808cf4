//! Variant loading.
//!
//! Turns the recommended product into the summary the offer displays: the
//! product title plus the first variant's title, ID, SKU, price and image.

use checkout_upsell_core::{ProductId, VariantSummary};
use tracing::{debug, instrument, warn};

use super::api::CatalogApi;
use super::machine::StallReason;
use crate::shopify::RecommendedProduct;

/// Project a product onto the summary of its first variant.
///
/// The image is the first variant's own image when it has one, else the
/// product's featured image. URL and alt text always come from the same
/// image. Returns `None` when the product has no variants.
#[must_use]
pub fn summarize(product: RecommendedProduct) -> Option<VariantSummary> {
    let RecommendedProduct {
        title,
        featured_image,
        variants,
        ..
    } = product;
    let variant = variants.into_iter().next()?;
    let image = variant.image.or(featured_image);

    Some(VariantSummary {
        product_title: title,
        variant_title: variant.title,
        variant_id: variant.id,
        sku: variant.sku,
        price: variant.price,
        image_alt_text: image.as_ref().and_then(|i| i.alt_text.clone()),
        image_url: image.map(|i| i.url),
    })
}

/// Fetch and summarize the recommended product.
///
/// # Errors
///
/// Returns a `StallReason` when the query fails, no product has the ID, or
/// the product has no variants.
#[instrument(skip(catalog), fields(product_id = %product_id))]
pub async fn load(
    catalog: &dyn CatalogApi,
    product_id: &ProductId,
) -> Result<VariantSummary, StallReason> {
    let product = catalog
        .recommended_product(product_id)
        .await
        .map_err(|e| {
            warn!(error = %e, "Recommended product query failed");
            StallReason::QueryFailed(e.to_string())
        })?
        .ok_or_else(|| {
            warn!("Recommended product not found");
            StallReason::ProductNotFound(product_id.to_string())
        })?;

    let summary = summarize(product).ok_or_else(|| {
        warn!("Recommended product has no variants");
        StallReason::NoVariants(product_id.to_string())
    })?;

    debug!(variant_id = %summary.variant_id, price = %summary.price, "Loaded recommended variant");
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use checkout_upsell_core::ProductVariantId;

    use super::*;
    use crate::extension::testing::{FakeCatalog, image, product, variant};

    #[test]
    fn test_summarize_prefers_variant_image() {
        let summary = summarize(product(
            "Y",
            "Mug",
            Some(image("https://cdn/featured.png", Some("Featured"))),
            vec![variant(
                "V1",
                "Black",
                "19.99",
                Some(image("https://cdn/v1.png", None)),
            )],
        ))
        .unwrap();

        assert_eq!(summary.image_url.as_deref(), Some("https://cdn/v1.png"));
        // Alt text is not borrowed from the featured image.
        assert_eq!(summary.image_alt_text, None);
    }

    #[test]
    fn test_summarize_falls_back_to_featured_image() {
        let summary = summarize(product(
            "Y",
            "Mug",
            Some(image("https://cdn/featured.png", Some("Featured"))),
            vec![variant("V1", "Black", "19.99", None)],
        ))
        .unwrap();

        assert_eq!(summary.image_url.as_deref(), Some("https://cdn/featured.png"));
        assert_eq!(summary.image_alt_text.as_deref(), Some("Featured"));
    }

    #[test]
    fn test_summarize_fields() {
        let summary = summarize(product(
            "Y",
            "Mug",
            None,
            vec![
                variant("V1", "Black", "19.99", None),
                variant("V2", "White", "21.00", None),
            ],
        ))
        .unwrap();

        assert_eq!(summary.product_title, "Mug");
        assert_eq!(summary.variant_title, "Black");
        assert_eq!(summary.variant_id, ProductVariantId::new("V1"));
        assert_eq!(summary.sku.as_deref(), Some("SKU-V1"));
        assert_eq!(summary.price.to_string(), "19.99 USD");
        assert_eq!(summary.image_url, None);
    }

    #[test]
    fn test_summarize_no_variants() {
        assert!(summarize(product("Y", "Mug", None, vec![])).is_none());
    }

    #[tokio::test]
    async fn test_load_missing_product_stalls() {
        let err = load(&FakeCatalog::default(), &ProductId::new("Y"))
            .await
            .unwrap_err();
        assert_eq!(err, StallReason::ProductNotFound("Y".to_string()));
    }

    #[tokio::test]
    async fn test_load_no_variants_stalls() {
        let catalog = FakeCatalog::default().with_product(product("Y", "Mug", None, vec![]));
        let err = load(&catalog, &ProductId::new("Y")).await.unwrap_err();
        assert_eq!(err, StallReason::NoVariants("Y".to_string()));
    }

    #[tokio::test]
    async fn test_load_failure_stalls() {
        let err = load(&FakeCatalog::default().failing(), &ProductId::new("Y"))
            .await
            .unwrap_err();
        assert!(matches!(err, StallReason::QueryFailed(_)));
    }
}
