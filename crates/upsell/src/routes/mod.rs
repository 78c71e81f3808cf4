//! HTTP route handlers for the upsell service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness check
//!
//! # Offer (HTMX fragments)
//! GET    /extensions/{target}?cart_id= - Mount and render the offer (204 until ready)
//! POST   /extensions/{target}/toggle   - Flip selection, sync cart, re-render
//! DELETE /extensions/{target}?cart_id= - Unmount the offer
//! ```

pub mod upsell;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the main router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health)).nest(
        "/extensions",
        Router::new()
            .route(
                "/{target}",
                get(upsell::show).delete(upsell::unmount),
            )
            .route("/{target}/toggle", post(upsell::toggle)),
    )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
