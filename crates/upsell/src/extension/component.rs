//! The mounted offer.
//!
//! One `UpsellExtension` exists per cart and render slot. At mount it takes a
//! snapshot of the cart, remembers the last-added line as its origin, and
//! from then on only moves forward through [`UpsellPhase`]. Cart changes made
//! after mount do not restart it.
//!
//! Every fetch races the liveness token. Once the offer is unmounted, a fetch
//! that completes late is discarded and the phase is left where it was.

use std::sync::Arc;

use checkout_upsell_core::CartLine;
use checkout_upsell_core::cart::last_added;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::api::{CartApi, CatalogApi};
use super::cart_sync::CartSync;
use super::machine::{Stage, UpsellPhase};
use super::view::OfferView;
use super::{loader, resolver};
use crate::config::ExtensionSettings;

pub struct UpsellExtension {
    catalog: Arc<dyn CatalogApi>,
    cart: Arc<dyn CartApi>,
    settings: ExtensionSettings,
    origin: Option<CartLine>,
    phase: UpsellPhase,
    selected: bool,
    liveness: CancellationToken,
}

impl UpsellExtension {
    /// Mount an offer over a snapshot of the cart's lines.
    #[must_use]
    pub fn mount(
        catalog: Arc<dyn CatalogApi>,
        cart: Arc<dyn CartApi>,
        settings: ExtensionSettings,
        lines: &[CartLine],
    ) -> Self {
        Self {
            catalog,
            cart,
            settings,
            origin: last_added(lines).cloned(),
            phase: UpsellPhase::Idle,
            selected: false,
            liveness: CancellationToken::new(),
        }
    }

    /// Token cancelled when the offer is unmounted.
    #[must_use]
    pub fn liveness(&self) -> CancellationToken {
        self.liveness.clone()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.liveness.is_cancelled()
    }

    /// Tear the offer down. In-flight fetches stop writing state.
    pub fn unmount(&self) {
        self.liveness.cancel();
    }

    #[must_use]
    pub const fn phase(&self) -> &UpsellPhase {
        &self.phase
    }

    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// Line that triggered the offer.
    #[must_use]
    pub const fn origin(&self) -> Option<&CartLine> {
        self.origin.as_ref()
    }

    /// Advance through resolution and loading as far as possible.
    ///
    /// Calling this on an offer that is already `Ready` or `Stalled` does
    /// nothing.
    #[instrument(skip(self), fields(phase = self.phase.name()))]
    pub async fn drive(&mut self) {
        self.resolve().await;
        self.load().await;
    }

    async fn resolve(&mut self) {
        if self.phase != UpsellPhase::Idle || !self.is_mounted() {
            return;
        }
        let Some(variant_id) = self.origin.as_ref().map(|line| line.merchandise.id.clone()) else {
            debug!("Cart was empty at mount, nothing to resolve");
            return;
        };

        self.transition(UpsellPhase::ResolutionPending {
            variant_id: variant_id.clone(),
        });

        let outcome = tokio::select! {
            biased;
            () = self.liveness.cancelled() => return,
            outcome = resolver::resolve(self.catalog.as_ref(), &variant_id, &self.settings) => outcome,
        };

        if !self.is_mounted() {
            return;
        }
        match outcome {
            Ok(resolution) => self.transition(UpsellPhase::Resolved(resolution)),
            Err(reason) => self.transition(UpsellPhase::Stalled {
                stage: Stage::Resolution,
                reason,
            }),
        }
    }

    async fn load(&mut self) {
        let UpsellPhase::Resolved(resolution) = &self.phase else {
            return;
        };
        if !self.is_mounted() {
            return;
        }
        let resolution = resolution.clone();

        self.transition(UpsellPhase::LoadPending(resolution.clone()));

        let outcome = tokio::select! {
            biased;
            () = self.liveness.cancelled() => return,
            outcome = loader::load(self.catalog.as_ref(), &resolution.product_id) => outcome,
        };

        if !self.is_mounted() {
            return;
        }
        match outcome {
            Ok(summary) => self.transition(UpsellPhase::Ready {
                recommendation: resolution,
                summary,
            }),
            Err(reason) => self.transition(UpsellPhase::Stalled {
                stage: Stage::Load,
                reason,
            }),
        }
    }

    fn transition(&mut self, next: UpsellPhase) {
        debug!(from = self.phase.name(), to = next.name(), "Offer phase changed");
        self.phase = next;
    }

    /// Flip the selection and request the matching cart change.
    ///
    /// Ignored (returns `None`) unless the offer is mounted and `Ready`. The
    /// selection flips immediately; the cart change runs in the background and
    /// its failure does not revert the selection.
    pub fn toggle(&mut self) -> Option<JoinHandle<()>> {
        if !self.is_mounted() {
            return None;
        }
        let summary = self.phase.summary()?;
        let origin = self.origin.as_ref()?;

        self.selected = !self.selected;
        debug!(selected = self.selected, variant_id = %summary.variant_id, "Offer toggled");

        let sync = CartSync::new(Arc::clone(&self.cart), origin.merchandise.id.clone());
        Some(sync.spawn(self.selected, summary.variant_id.clone()))
    }

    /// What to render, or `None` until the offer is `Ready`.
    #[must_use]
    pub fn view(&self) -> Option<OfferView> {
        self.phase
            .summary()
            .map(|summary| OfferView::new(summary, self.settings.title(), self.selected))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use checkout_upsell_core::{CartLineChange, CartLineId, ProductId, ProductVariantId};
    use tokio::sync::Notify;

    use super::*;
    use crate::extension::machine::{Resolution, ResolutionSource, Stage, StallReason};
    use crate::extension::testing::{FakeCart, FakeCatalog, line, product, variant};
    use crate::shopify::{ProductMetafields, RecommendedProduct, ShopifyError};

    fn settings() -> ExtensionSettings {
        ExtensionSettings {
            upsell_title: None,
            fallback_product_id: Some(ProductId::new("F")),
        }
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog::default()
            .with_recommendation("X", r#"[["Y","Z"]]"#)
            .with_product(product(
                "Y",
                "Mug",
                None,
                vec![variant("V1", "Black", "19.99", None)],
            ))
    }

    fn mount(catalog: FakeCatalog, cart: &Arc<FakeCart>) -> UpsellExtension {
        let lines = cart.snapshot();
        UpsellExtension::mount(Arc::new(catalog), cart.clone(), settings(), &lines)
    }

    #[tokio::test]
    async fn test_drive_reaches_ready() {
        let cart = FakeCart::with_lines(vec![line("L0", "W"), line("L1", "X")]);
        let mut offer = mount(catalog(), &cart);
        assert_eq!(offer.phase(), &UpsellPhase::Idle);
        assert!(offer.view().is_none());

        offer.drive().await;

        let recommendation = offer.phase().recommendation().unwrap();
        assert_eq!(recommendation.product_id, ProductId::new("Y"));
        assert_eq!(recommendation.source, ResolutionSource::Metafield);

        let view = offer.view().unwrap();
        assert_eq!(view.heading, "You may also Like");
        assert_eq!(view.product_title, "Mug");
        assert_eq!(view.variant_title, "Black");
        assert_eq!(view.price_label, "19.99 USD");
        assert!(!view.selected);
    }

    #[tokio::test]
    async fn test_drive_is_idempotent_once_ready() {
        let cart = FakeCart::with_lines(vec![line("L1", "X")]);
        let mut offer = mount(catalog(), &cart);
        offer.drive().await;
        let ready = offer.phase().clone();

        offer.drive().await;

        assert_eq!(offer.phase(), &ready);
    }

    #[tokio::test]
    async fn test_empty_cart_stays_idle() {
        let cart = FakeCart::with_lines(vec![]);
        let mut offer = mount(catalog(), &cart);

        offer.drive().await;

        assert!(offer.origin().is_none());
        assert_eq!(offer.phase(), &UpsellPhase::Idle);
        assert!(offer.view().is_none());
    }

    #[tokio::test]
    async fn test_resolution_failure_stalls() {
        let cart = FakeCart::with_lines(vec![line("L1", "X")]);
        let mut offer = mount(catalog().failing(), &cart);

        offer.drive().await;

        assert!(matches!(
            offer.phase(),
            UpsellPhase::Stalled {
                stage: Stage::Resolution,
                reason: StallReason::QueryFailed(_),
            }
        ));
        assert!(offer.view().is_none());
    }

    #[tokio::test]
    async fn test_product_without_variants_stalls_in_load() {
        let catalog = FakeCatalog::default()
            .with_recommendation("X", r#"["Y"]"#)
            .with_product(product("Y", "Mug", None, vec![]));
        let cart = FakeCart::with_lines(vec![line("L1", "X")]);
        let mut offer = mount(catalog, &cart);

        offer.drive().await;

        assert_eq!(
            offer.phase(),
            &UpsellPhase::Stalled {
                stage: Stage::Load,
                reason: StallReason::NoVariants("Y".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_toggle_ignored_before_ready() {
        let cart = FakeCart::with_lines(vec![line("L1", "X")]);
        let mut offer = mount(catalog(), &cart);

        assert!(offer.toggle().is_none());
        assert!(!offer.is_selected());
        assert!(cart.applied().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_adds_then_removes_origin_line() {
        let cart = FakeCart::with_lines(vec![line("L0", "W"), line("L1", "X")]);
        let mut offer = mount(catalog(), &cart);
        offer.drive().await;

        offer.toggle().unwrap().await.unwrap();
        assert!(offer.is_selected());
        assert!(offer.view().unwrap().selected);

        offer.toggle().unwrap().await.unwrap();
        assert!(!offer.is_selected());

        assert_eq!(
            cart.applied(),
            vec![
                CartLineChange::AddCartLine {
                    merchandise_id: ProductVariantId::new("V1"),
                    quantity: 1,
                },
                CartLineChange::RemoveCartLine {
                    id: CartLineId::new("L1"),
                    quantity: 1,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_cart_change_keeps_selection() {
        let cart = FakeCart::failing(vec![line("L1", "X")]);
        let mut offer = UpsellExtension::mount(
            Arc::new(catalog()),
            cart.clone(),
            settings(),
            &[line("L1", "X")],
        );
        offer.drive().await;

        offer.toggle().unwrap().await.unwrap();

        assert!(offer.is_selected());
        assert!(cart.applied().is_empty());
    }

    #[tokio::test]
    async fn test_unmounted_offer_does_not_advance() {
        let cart = FakeCart::with_lines(vec![line("L1", "X")]);
        let mut offer = mount(catalog(), &cart);
        offer.unmount();

        offer.drive().await;

        assert!(!offer.is_mounted());
        assert_eq!(offer.phase(), &UpsellPhase::Idle);
        assert!(offer.toggle().is_none());
    }

    /// Catalog that parks the fetch for one stage until released.
    struct GatedCatalog {
        inner: FakeCatalog,
        gated: Stage,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl GatedCatalog {
        async fn gate(&self, stage: Stage) {
            if stage == self.gated {
                self.entered.notify_one();
                self.release.notified().await;
            }
        }
    }

    #[async_trait]
    impl CatalogApi for GatedCatalog {
        async fn complementary_products(
            &self,
            variant_id: &ProductVariantId,
        ) -> Result<Option<ProductMetafields>, ShopifyError> {
            self.gate(Stage::Resolution).await;
            self.inner.complementary_products(variant_id).await
        }

        async fn recommended_product(
            &self,
            product_id: &ProductId,
        ) -> Result<Option<RecommendedProduct>, ShopifyError> {
            self.gate(Stage::Load).await;
            self.inner.recommended_product(product_id).await
        }
    }

    /// Drive an offer whose `gated` fetch is in flight when it is unmounted.
    async fn drive_unmounted_mid_fetch(gated: Stage) -> UpsellExtension {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let catalog = GatedCatalog {
            inner: catalog(),
            gated,
            entered: entered.clone(),
            release: release.clone(),
        };
        let cart = FakeCart::with_lines(vec![line("L1", "X")]);
        let mut offer =
            UpsellExtension::mount(Arc::new(catalog), cart, settings(), &[line("L1", "X")]);
        let liveness = offer.liveness();

        let task = tokio::spawn(async move {
            offer.drive().await;
            offer
        });
        entered.notified().await;
        liveness.cancel();
        release.notify_one();
        task.await.unwrap()
    }

    #[tokio::test]
    async fn test_unmount_discards_in_flight_resolution() {
        let offer = drive_unmounted_mid_fetch(Stage::Resolution).await;

        assert_eq!(
            offer.phase(),
            &UpsellPhase::ResolutionPending {
                variant_id: ProductVariantId::new("X"),
            }
        );
        assert!(offer.view().is_none());
    }

    #[tokio::test]
    async fn test_unmount_discards_in_flight_load() {
        let offer = drive_unmounted_mid_fetch(Stage::Load).await;

        assert_eq!(
            offer.phase(),
            &UpsellPhase::LoadPending(Resolution {
                product_id: ProductId::new("Y"),
                source: ResolutionSource::Metafield,
            })
        );
        assert!(offer.phase().summary().is_none());
        assert!(offer.view().is_none());
    }
}
