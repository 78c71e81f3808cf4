//! Conversions from generated GraphQL response types to domain types.

use checkout_upsell_core::{CartLine, CartLineId, Price, ProductId, ProductVariantId};
use tracing::warn;

use crate::shopify::ShopifyError;
use crate::shopify::types::{Image, Metafield, ProductMetafields, ProductVariant, RecommendedProduct};

use super::queries::{
    cart_lines_add, cart_lines_remove, cart_lines_update, get_cart_lines,
    get_complementary_products, get_recommended_product,
};

// =============================================================================
// Catalog conversions
// =============================================================================

/// Metafields of the product behind a variant node.
///
/// Returns `None` for nodes that are not product variants.
pub fn convert_metafields(
    node: get_complementary_products::GetComplementaryProductsNode,
) -> Option<ProductMetafields> {
    let get_complementary_products::GetComplementaryProductsNode::ProductVariant(variant) = node
    else {
        return None;
    };

    Some(ProductMetafields {
        metafields: variant
            .product
            .metafields
            .into_iter()
            .map(|m| {
                m.map(|m| Metafield {
                    key: m.key,
                    kind: m.type_,
                    value: m.value,
                })
            })
            .collect(),
    })
}

fn currency_code_to_string(code: get_recommended_product::CurrencyCode) -> String {
    match code {
        get_recommended_product::CurrencyCode::Other(code) => code,
        known => format!("{known:?}"),
    }
}

fn convert_image(image: get_recommended_product::ImageFields) -> Image {
    Image {
        id: image.id,
        url: image.url,
        alt_text: image.alt_text,
    }
}

fn convert_variant(
    variant: get_recommended_product::ProductVariantFields,
) -> Result<ProductVariant, ShopifyError> {
    let currency_code = currency_code_to_string(variant.price.currency_code);
    let price = Price::parse(&variant.price.amount, &currency_code)
        .map_err(|e| ShopifyError::InvalidData(format!("variant {}: {e}", variant.id)))?;

    Ok(ProductVariant {
        id: ProductVariantId::new(variant.id),
        sku: variant.sku,
        title: variant.title,
        price,
        image: variant.image.map(convert_image),
    })
}

/// Convert a product response.
///
/// # Errors
///
/// Returns `ShopifyError::InvalidData` if a variant carries an unparsable price.
pub fn convert_recommended_product(
    product: get_recommended_product::GetRecommendedProductProduct,
) -> Result<RecommendedProduct, ShopifyError> {
    let variants = product
        .variants
        .edges
        .into_iter()
        .map(|edge| convert_variant(edge.node))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RecommendedProduct {
        id: ProductId::new(product.id),
        title: product.title,
        featured_image: product.featured_image.map(convert_image),
        variants,
    })
}

// =============================================================================
// Cart conversions
// =============================================================================

pub fn convert_cart_lines(cart: get_cart_lines::GetCartLinesCart) -> Vec<CartLine> {
    cart.lines
        .edges
        .into_iter()
        .filter_map(|edge| match edge.node {
            get_cart_lines::GetCartLinesCartLinesEdgesNode::CartLine(line) => {
                Some(convert_cart_line(line))
            }
            get_cart_lines::GetCartLinesCartLinesEdgesNode::ComponentizableCartLine => {
                warn!("Skipping componentizable cart line");
                None
            }
        })
        .collect()
}

fn convert_cart_line(line: get_cart_lines::CartLineFields) -> CartLine {
    // ProductVariant is the only variant in this enum
    let get_cart_lines::CartLineFieldsMerchandise::ProductVariant(variant) = line.merchandise;
    CartLine::new(
        CartLineId::new(line.id),
        ProductVariantId::new(variant.id),
        u32::try_from(line.quantity).unwrap_or(0),
    )
}

/// Cart fields echoed back by a successful mutation.
#[derive(Debug)]
pub struct MutatedCart {
    pub id: String,
    pub total_quantity: i64,
}

pub struct CartUserError {
    field: Option<Vec<String>>,
    message: String,
    code: Option<String>,
}

impl CartUserError {
    fn describe(self) -> String {
        let message = match self.field {
            Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), self.message),
            _ => self.message,
        };
        match self.code {
            Some(code) => format!("{message} ({code})"),
            None => message,
        }
    }
}

/// The shared shape of the `cartLines*` mutation payloads.
pub trait CartMutationPayload {
    fn into_parts(self) -> (Option<MutatedCart>, Vec<CartUserError>);
}

macro_rules! cart_mutation_payload {
    ($module:ident :: $payload:ident) => {
        impl CartMutationPayload for $module::$payload {
            fn into_parts(self) -> (Option<MutatedCart>, Vec<CartUserError>) {
                let cart = self.cart.map(|c| MutatedCart {
                    id: c.id,
                    total_quantity: c.total_quantity,
                });
                let user_errors = self
                    .user_errors
                    .into_iter()
                    .map(|e| CartUserError {
                        field: e.field,
                        message: e.message,
                        code: e.code.map(|code| match code {
                            $module::CartErrorCode::Other(code) => code,
                            known => format!("{known:?}"),
                        }),
                    })
                    .collect();
                (cart, user_errors)
            }
        }
    };
}

cart_mutation_payload!(cart_lines_add::CartLinesAddCartLinesAdd);
cart_mutation_payload!(cart_lines_update::CartLinesUpdateCartLinesUpdate);
cart_mutation_payload!(cart_lines_remove::CartLinesRemoveCartLinesRemove);

/// Fold a mutation payload into a result, surfacing user errors.
pub fn check_mutation_payload<P: CartMutationPayload>(
    payload: Option<P>,
    action: &str,
) -> Result<MutatedCart, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::graphql_message(format!("Failed to {action}")));
    };

    let (cart, user_errors) = payload.into_parts();

    if !user_errors.is_empty() {
        return Err(ShopifyError::UserError(
            user_errors
                .into_iter()
                .map(CartUserError::describe)
                .collect::<Vec<_>>()
                .join("; "),
        ));
    }

    cart.ok_or_else(|| ShopifyError::graphql_message(format!("Failed to {action}")))
}
