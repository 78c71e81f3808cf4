//! Cart synchronization for the selection toggle.
//!
//! Selecting adds one unit of the recommended variant. Deselecting removes
//! one unit from the line holding the variant that triggered the offer, not
//! the recommended one.

use std::sync::Arc;

use checkout_upsell_core::cart::find_by_merchandise;
use checkout_upsell_core::{CartLine, CartLineChange, ProductVariantId};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::api::CartApi;
use crate::shopify::ShopifyError;

/// Change to request for a selection state.
///
/// Returns `None` on deselect when no line holds the origin variant.
#[must_use]
pub fn plan_change(
    selected: bool,
    recommended: &ProductVariantId,
    origin: &ProductVariantId,
    lines: &[CartLine],
) -> Option<CartLineChange> {
    if selected {
        return Some(CartLineChange::AddCartLine {
            merchandise_id: recommended.clone(),
            quantity: 1,
        });
    }

    find_by_merchandise(lines, origin).map(|line| CartLineChange::RemoveCartLine {
        id: line.id.clone(),
        quantity: 1,
    })
}

/// Issues cart changes on behalf of one mounted offer.
#[derive(Clone)]
pub struct CartSync {
    cart: Arc<dyn CartApi>,
    origin: ProductVariantId,
}

impl CartSync {
    #[must_use]
    pub fn new(cart: Arc<dyn CartApi>, origin: ProductVariantId) -> Self {
        Self { cart, origin }
    }

    /// Request the change for a selection state and wait for it.
    ///
    /// Returns the change applied, if any.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` if reading the cart or applying the change fails.
    pub async fn sync(
        &self,
        selected: bool,
        recommended: &ProductVariantId,
    ) -> Result<Option<CartLineChange>, ShopifyError> {
        let lines = if selected {
            Vec::new()
        } else {
            self.cart.lines().await?
        };

        let Some(change) = plan_change(selected, recommended, &self.origin, &lines) else {
            debug!(origin = %self.origin, "No cart line holds the origin variant");
            return Ok(None);
        };

        self.cart.apply(change.clone()).await?;
        Ok(Some(change))
    }

    /// Fire-and-forget variant of [`Self::sync`].
    ///
    /// Failures are logged; the caller's selection state is left as is.
    #[must_use = "dropping the handle detaches the task"]
    pub fn spawn(self, selected: bool, recommended: ProductVariantId) -> JoinHandle<()> {
        let span = info_span!("cart_sync", selected, recommended = %recommended);
        tokio::spawn(
            async move {
                match self.sync(selected, &recommended).await {
                    Ok(Some(change)) => debug!(?change, "Cart change applied"),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Cart change failed"),
                }
            }
            .instrument(span),
        )
    }
}
