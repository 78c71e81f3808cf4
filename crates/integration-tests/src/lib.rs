//! End-to-end tests for the checkout upsell offer.
//!
//! Each test starts a [`MockStore`], a `wiremock` server answering the
//! Storefront GraphQL operations the offer issues, and drives the real
//! router against it in-process.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p checkout-upsell-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use checkout_upsell::config::{
    ExtensionSettings, MountConfig, ShopifyStorefrontConfig, UpsellConfig,
};
use checkout_upsell::shopify::StorefrontClient;
use checkout_upsell::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GRAPHQL_PATH: &str = "/api/2026-01/graphql.json";
pub const TARGET: &str = "purchase.checkout.cart-line-list.render-after";

/// A Storefront API stand-in.
pub struct MockStore {
    pub server: MockServer,
}

impl MockStore {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Router wired to this store.
    ///
    /// # Panics
    ///
    /// Panics if the mock server URI is not a valid URL.
    #[must_use]
    pub fn app(&self, settings: ExtensionSettings) -> Router {
        let endpoint = url::Url::parse(&format!("{}{GRAPHQL_PATH}", self.server.uri()))
            .expect("mock server uri is a valid url");
        let token = SecretString::from("shpat_test_7fK2qLx9".to_string());
        let client = StorefrontClient::with_endpoint(endpoint, token.clone());

        let config = UpsellConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            shopify: ShopifyStorefrontConfig {
                store: "test-store.myshopify.com".to_string(),
                api_version: "2026-01".to_string(),
                storefront_private_token: token,
            },
            settings,
            mounts: MountConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        checkout_upsell::app(AppState::with_client(config, client))
    }

    async fn respond(&self, matcher: Value, body: Value) {
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .and(body_partial_json(matcher))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Cart `cart_id` holds `(line id, variant id, quantity)` in cart order.
    pub async fn with_cart(&self, cart_id: &str, lines: &[(&str, &str, i64)]) {
        let edges: Vec<Value> = lines
            .iter()
            .map(|(id, merchandise, quantity)| {
                json!({
                    "node": {
                        "__typename": "CartLine",
                        "id": id,
                        "quantity": quantity,
                        "merchandise": { "__typename": "ProductVariant", "id": merchandise }
                    }
                })
            })
            .collect();
        self.respond(
            json!({ "operationName": "GetCartLines", "variables": { "cartId": cart_id } }),
            json!({ "data": { "cart": { "lines": { "edges": edges } } } }),
        )
        .await;
    }

    /// Forget every stubbed operation and recorded request, as when the
    /// shopper changes the cart between page renders.
    pub async fn reset(&self) {
        self.server.reset().await;
    }

    /// The product behind `variant_id` carries this complementary-products value.
    pub async fn with_metafield(&self, variant_id: &str, value: &str) {
        self.respond(
            json!({ "operationName": "GetComplementaryProducts", "variables": { "id": variant_id } }),
            json!({
                "data": {
                    "node": {
                        "__typename": "ProductVariant",
                        "product": {
                            "metafields": [{
                                "type": "list.product_reference",
                                "key": "complementary_products",
                                "value": value
                            }]
                        }
                    }
                }
            }),
        )
        .await;
    }

    /// Product `product_id` with the given `(variant id, title, amount)` variants.
    pub async fn with_product(&self, product_id: &str, title: &str, variants: &[(&str, &str, &str)]) {
        let edges: Vec<Value> = variants
            .iter()
            .map(|(id, variant_title, amount)| {
                json!({
                    "node": {
                        "id": id,
                        "sku": null,
                        "title": variant_title,
                        "price": { "amount": amount, "currencyCode": "USD" },
                        "image": null
                    }
                })
            })
            .collect();
        self.respond(
            json!({ "operationName": "GetRecommendedProduct", "variables": { "id": product_id } }),
            json!({
                "data": {
                    "product": {
                        "id": product_id,
                        "title": title,
                        "featuredImage": { "id": null, "url": "https://cdn.shopify.com/p.png", "altText": title },
                        "variants": { "edges": edges }
                    }
                }
            }),
        )
        .await;
    }

    /// Every cart mutation succeeds.
    pub async fn accept_cart_mutations(&self) {
        for (operation, field) in [
            ("CartLinesAdd", "cartLinesAdd"),
            ("CartLinesUpdate", "cartLinesUpdate"),
            ("CartLinesRemove", "cartLinesRemove"),
        ] {
            self.respond(
                json!({ "operationName": operation }),
                json!({
                    "data": {
                        field: { "cart": { "id": "c1", "totalQuantity": 1 }, "userErrors": [] }
                    }
                }),
            )
            .await;
        }
    }

    /// Request bodies received so far for one operation.
    pub async fn operations(&self, operation: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
            .filter(|body| body["operationName"] == operation)
            .collect()
    }

    /// Wait until `count` requests for an operation arrived. Cart mutations
    /// run in the background, so tests poll for them.
    ///
    /// # Panics
    ///
    /// Panics if they do not arrive within two seconds.
    pub async fn wait_for(&self, operation: &str, count: usize) -> Vec<Value> {
        for _ in 0..100 {
            let seen = self.operations(operation).await;
            if seen.len() >= count {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("timed out waiting for {count} {operation} request(s)");
    }
}

/// A response reduced to what the tests assert on.
pub struct Fragment {
    pub status: StatusCode,
    pub body: String,
}

async fn send(app: &Router, request: Request<Body>) -> Fragment {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    Fragment {
        status,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// # Panics
///
/// Panics if the request cannot be built.
pub async fn get(app: &Router, uri: &str) -> Fragment {
    let request = Request::get(uri)
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}

/// # Panics
///
/// Panics if the request cannot be built.
pub async fn post_form(app: &Router, uri: &str, form: &str) -> Fragment {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("valid request");
    send(app, request).await
}

/// # Panics
///
/// Panics if the request cannot be built.
pub async fn delete(app: &Router, uri: &str) -> Fragment {
    let request = Request::delete(uri)
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}
