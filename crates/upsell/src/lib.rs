//! Checkout upsell service library.
//!
//! Serves a complementary-product offer into the checkout's cart-line-list
//! slot. The offer looks at the most recently added cart line, resolves a
//! recommended product from its complementary-products metafield, loads that
//! product's first variant and lets the shopper add it with one toggle.
//!
//! Exposed as a library so the HTTP surface can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod extension;
pub mod mounts;
pub mod routes;
pub mod shopify;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
///
/// Sentry layers are added by the binary, outermost.
#[must_use]
pub fn app(state: AppState) -> Router {
    routes::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
