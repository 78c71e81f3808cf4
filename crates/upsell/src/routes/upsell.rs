//! Offer route handlers.
//!
//! The checkout page loads the offer fragment into its cart-line-list slot
//! and swaps it on every toggle. An offer that is not ready answers
//! `204 No Content` so the slot stays empty.

use std::sync::Arc;

use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use checkout_upsell_core::CartId;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::extension::{ExtensionTarget, OfferTemplate, UpsellExtension};
use crate::mounts::MountedOffer;
use crate::shopify::ShopifyError;
use crate::state::AppState;

/// Cart the request is made for.
#[derive(Debug, Deserialize)]
pub struct CartParams {
    pub cart_id: String,
}

impl CartParams {
    fn cart_id(&self) -> Result<CartId> {
        let cart_id = self.cart_id.trim();
        if cart_id.is_empty() {
            return Err(AppError::BadRequest("cart_id is required".to_string()));
        }
        Ok(CartId::new(cart_id))
    }
}

/// Mount a new offer from the cart's current lines.
///
/// Mounting snapshots the lines; the mounted offer never re-reads them to
/// pick a different recommendation.
async fn mount(
    state: &AppState,
    cart_id: &CartId,
) -> std::result::Result<UpsellExtension, ShopifyError> {
    let storefront = state.storefront().clone();
    let cart = storefront.cart(cart_id.clone());
    let lines = storefront.cart_lines(cart_id).await?;
    debug!(lines = lines.len(), "Mounting offer");

    Ok(UpsellExtension::mount(
        Arc::new(storefront),
        Arc::new(cart),
        state.config().settings.clone(),
        &lines,
    ))
}

/// The offer mounted for a cart, mounting one if there is none.
async fn mounted_offer(
    state: &AppState,
    target: ExtensionTarget,
    cart_id: &CartId,
) -> Result<MountedOffer> {
    let mounted = state
        .mounts()
        .get_or_mount(target, cart_id.clone(), mount(state, cart_id))
        .await?;

    Ok(mounted)
}

fn render(offer: &UpsellExtension, target: ExtensionTarget, cart_id: &CartId) -> Response {
    match offer.view() {
        Some(view) => OfferTemplate::new(view, target, cart_id.as_str()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Render the offer fragment, driving it forward first.
///
/// Every page render is a new mount: the selection starts cleared and the
/// recommendation follows the cart's current last line.
#[instrument(skip(state), fields(cart_id = %params.cart_id))]
pub async fn show(
    State(state): State<AppState>,
    Path(target): Path<String>,
    Query(params): Query<CartParams>,
) -> Result<Response> {
    let target: ExtensionTarget = target.parse()?;
    let cart_id = params.cart_id()?;

    let mounted = state
        .mounts()
        .remount(target, cart_id.clone(), mount(&state, &cart_id))
        .await?;
    let mut offer = mounted.lock().await;
    offer.drive().await;

    Ok(render(&offer, target, &cart_id))
}

/// Flip the selection and re-render.
///
/// Reuses the offer mounted by the last render. The cart change runs in the
/// background; the response does not wait for it.
#[instrument(skip(state), fields(cart_id = %params.cart_id))]
pub async fn toggle(
    State(state): State<AppState>,
    Path(target): Path<String>,
    Form(params): Form<CartParams>,
) -> Result<Response> {
    let target: ExtensionTarget = target.parse()?;
    let cart_id = params.cart_id()?;

    let mounted = mounted_offer(&state, target, &cart_id).await?;
    let mut offer = mounted.lock().await;
    offer.drive().await;

    if offer.toggle().is_some() {
        let selected = if offer.is_selected() { "selected" } else { "deselected" };
        add_breadcrumb(
            "upsell",
            "Offer toggled",
            Some(&[("cart_id", cart_id.as_str()), ("selection", selected)]),
        );
    }

    Ok(render(&offer, target, &cart_id))
}

/// Unmount the offer for a cart.
#[instrument(skip(state), fields(cart_id = %params.cart_id))]
pub async fn unmount(
    State(state): State<AppState>,
    Path(target): Path<String>,
    Query(params): Query<CartParams>,
) -> Result<StatusCode> {
    let target: ExtensionTarget = target.parse()?;
    let cart_id = params.cart_id()?;

    let existed = state.mounts().unmount(target, &cart_id).await;
    debug!(existed, "Offer unmount requested");

    Ok(StatusCode::NO_CONTENT)
}
