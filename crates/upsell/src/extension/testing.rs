//! In-memory catalog and cart for component tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use checkout_upsell_core::{
    CartLine, CartLineChange, CartLineId, Price, ProductId, ProductVariantId,
};

use super::api::{CartApi, CatalogApi};
use crate::shopify::{
    COMPLEMENTARY_PRODUCTS_KEY, Image, Metafield, ProductMetafields, ProductVariant,
    RecommendedProduct, ShopifyError,
};

#[derive(Default)]
pub struct FakeCatalog {
    metafields: HashMap<String, ProductMetafields>,
    products: HashMap<String, RecommendedProduct>,
    failing: bool,
}

impl FakeCatalog {
    pub fn with_metafields(mut self, variant_id: &str, metafields: ProductMetafields) -> Self {
        self.metafields.insert(variant_id.to_string(), metafields);
        self
    }

    pub fn with_recommendation(self, variant_id: &str, value: &str) -> Self {
        self.with_metafields(
            variant_id,
            ProductMetafields {
                metafields: vec![Some(Metafield {
                    key: COMPLEMENTARY_PRODUCTS_KEY.to_string(),
                    kind: "list.product_reference".to_string(),
                    value: value.to_string(),
                })],
            },
        )
    }

    pub fn with_product(mut self, product: RecommendedProduct) -> Self {
        self.products.insert(product.id.to_string(), product);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn complementary_products(
        &self,
        variant_id: &ProductVariantId,
    ) -> Result<Option<ProductMetafields>, ShopifyError> {
        if self.failing {
            return Err(ShopifyError::graphql_message("catalog unavailable"));
        }
        Ok(self.metafields.get(variant_id.as_str()).cloned())
    }

    async fn recommended_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<RecommendedProduct>, ShopifyError> {
        if self.failing {
            return Err(ShopifyError::graphql_message("catalog unavailable"));
        }
        Ok(self.products.get(product_id.as_str()).cloned())
    }
}

#[derive(Default)]
pub struct FakeCart {
    lines: Mutex<Vec<CartLine>>,
    applied: Mutex<Vec<CartLineChange>>,
    failing: bool,
}

impl FakeCart {
    pub fn with_lines(lines: Vec<CartLine>) -> Arc<Self> {
        Arc::new(Self {
            lines: Mutex::new(lines),
            ..Self::default()
        })
    }

    pub fn failing(lines: Vec<CartLine>) -> Arc<Self> {
        Arc::new(Self {
            lines: Mutex::new(lines),
            failing: true,
            ..Self::default()
        })
    }

    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn applied(&self) -> Vec<CartLineChange> {
        self.applied.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CartApi for FakeCart {
    async fn lines(&self) -> Result<Vec<CartLine>, ShopifyError> {
        if self.failing {
            return Err(ShopifyError::graphql_message("cart unavailable"));
        }
        Ok(self.snapshot())
    }

    async fn apply(&self, change: CartLineChange) -> Result<(), ShopifyError> {
        if self.failing {
            return Err(ShopifyError::UserError("cart unavailable".to_string()));
        }
        if let Ok(mut applied) = self.applied.lock() {
            applied.push(change);
        }
        Ok(())
    }
}

pub fn line(id: &str, merchandise: &str) -> CartLine {
    CartLine::new(CartLineId::new(id), ProductVariantId::new(merchandise), 1)
}

pub fn image(url: &str, alt: Option<&str>) -> Image {
    Image {
        id: None,
        url: url.to_string(),
        alt_text: alt.map(str::to_string),
    }
}

pub fn variant(id: &str, title: &str, amount: &str, image: Option<Image>) -> ProductVariant {
    ProductVariant {
        id: ProductVariantId::new(id),
        sku: Some(format!("SKU-{id}")),
        title: title.to_string(),
        price: Price::parse(amount, "USD").unwrap_or_else(|e| panic!("bad test price: {e}")),
        image,
    }
}

pub fn product(
    id: &str,
    title: &str,
    featured_image: Option<Image>,
    variants: Vec<ProductVariant>,
) -> RecommendedProduct {
    RecommendedProduct {
        id: ProductId::new(id),
        title: title.to_string(),
        featured_image,
        variants,
    }
}
