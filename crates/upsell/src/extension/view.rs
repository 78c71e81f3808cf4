//! Presentation of a ready offer.

use askama::Template;
use askama_web::WebTemplate;
use checkout_upsell_core::VariantSummary;

use super::target::ExtensionTarget;

/// Everything the offer fragment displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferView {
    pub heading: String,
    pub selected: bool,
    pub product_title: String,
    pub variant_title: String,
    /// `"{amount} {currencyCode}"`.
    pub price_label: String,
    pub image_url: Option<String>,
    pub image_alt: String,
}

impl OfferView {
    #[must_use]
    pub fn new(summary: &VariantSummary, heading: &str, selected: bool) -> Self {
        Self {
            heading: heading.to_string(),
            selected,
            product_title: summary.product_title.clone(),
            variant_title: summary.variant_title.clone(),
            price_label: summary.price.to_string(),
            image_url: summary.image_url.clone(),
            image_alt: summary
                .image_alt_text
                .clone()
                .unwrap_or_else(|| summary.product_title.clone()),
        }
    }
}

/// HTMX fragment for the cart-line-list slot.
///
/// The whole row is a form button that posts the toggle and swaps the
/// fragment with the re-rendered one.
#[derive(Template, WebTemplate)]
#[template(path = "upsell/offer.html")]
pub struct OfferTemplate {
    pub offer: OfferView,
    pub target: &'static str,
    pub toggle_path: String,
    pub cart_id: String,
}

impl OfferTemplate {
    #[must_use]
    pub fn new(offer: OfferView, target: ExtensionTarget, cart_id: &str) -> Self {
        Self {
            offer,
            target: target.as_str(),
            toggle_path: format!("/extensions/{}/toggle", target.as_str()),
            cart_id: cart_id.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use checkout_upsell_core::{Price, ProductVariantId};

    use super::*;

    fn summary() -> VariantSummary {
        VariantSummary {
            product_title: "Mug & Saucer".to_string(),
            variant_title: "Black".to_string(),
            variant_id: ProductVariantId::new("V1"),
            sku: None,
            price: Price::parse("19.99", "USD").unwrap(),
            image_url: Some("https://cdn.shopify.com/mug.png".to_string()),
            image_alt_text: None,
        }
    }

    #[test]
    fn test_view_fields() {
        let view = OfferView::new(&summary(), "You may also Like", true);
        assert_eq!(view.price_label, "19.99 USD");
        assert_eq!(view.image_alt, "Mug & Saucer");
        assert!(view.selected);
    }

    #[test]
    fn test_render_fragment() {
        let view = OfferView::new(&summary(), "Pairs well with", false);
        let html = OfferTemplate::new(view, ExtensionTarget::CartLineListRenderAfter, "c1")
            .render()
            .unwrap();

        assert!(html.contains("Pairs well with"));
        assert!(html.contains("Saucer"));
        assert!(!html.contains("Mug & Saucer"));
        assert!(html.contains("- Black"));
        assert!(html.contains("19.99 USD"));
        assert!(html.contains(
            r#"hx-post="/extensions/purchase.checkout.cart-line-list.render-after/toggle""#
        ));
        assert!(html.contains(r#"aria-pressed="false""#));
        assert!(html.contains(r#"data-checked="false""#));
        assert!(!html.contains(r#"type="checkbox""#));
    }

    #[test]
    fn test_render_selected_without_image() {
        let mut summary = summary();
        summary.image_url = None;
        let view = OfferView::new(&summary, "Heading", true);
        let html = OfferTemplate::new(view, ExtensionTarget::CartLineListRenderAfter, "c1")
            .render()
            .unwrap();

        assert!(html.contains(r#"aria-pressed="true""#));
        assert!(html.contains(r#"data-checked="true""#));
        assert!(!html.contains("<img"));
    }
}
