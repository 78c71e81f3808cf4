//! Registry of mounted offers.
//!
//! Offers are keyed by render slot and cart. Entries idle past the configured
//! timeout, or pushed out by capacity, are evicted; eviction and explicit
//! unmount both cancel the offer's liveness token so a fetch still in flight
//! never writes into a torn-down offer.

use std::future::Future;
use std::sync::Arc;

use checkout_upsell_core::CartId;
use moka::future::Cache;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::MountConfig;
use crate::extension::{ExtensionTarget, UpsellExtension};
use crate::shopify::ShopifyError;

type MountKey = (ExtensionTarget, CartId);

/// Shared handle to one mounted offer.
#[derive(Clone)]
pub struct MountedOffer {
    offer: Arc<Mutex<UpsellExtension>>,
    liveness: CancellationToken,
}

impl MountedOffer {
    fn new(offer: UpsellExtension) -> Self {
        Self {
            liveness: offer.liveness(),
            offer: Arc::new(Mutex::new(offer)),
        }
    }

    /// Exclusive access to the offer. One request drives it at a time.
    pub async fn lock(&self) -> MutexGuard<'_, UpsellExtension> {
        self.offer.lock().await
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.liveness.is_cancelled()
    }
}

#[derive(Clone)]
pub struct MountRegistry {
    mounts: Cache<MountKey, MountedOffer>,
}

impl MountRegistry {
    #[must_use]
    pub fn new(config: MountConfig) -> Self {
        let mounts = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_idle(config.idle_timeout)
            .eviction_listener(|key: Arc<MountKey>, offer: MountedOffer, cause| {
                debug!(slot = %key.0, cart_id = %key.1, ?cause, "Offer unmounted");
                offer.liveness.cancel();
            })
            .build();

        Self { mounts }
    }

    /// The offer mounted for this slot and cart, if any.
    pub async fn get(&self, target: ExtensionTarget, cart_id: &CartId) -> Option<MountedOffer> {
        self.mounts.get(&(target, cart_id.clone())).await
    }

    /// The mounted offer, mounting it with `init` first if needed.
    ///
    /// Concurrent callers for the same key share one `init`.
    ///
    /// # Errors
    ///
    /// Returns the error `init` failed with. Nothing is mounted in that case.
    pub async fn get_or_mount<F>(
        &self,
        target: ExtensionTarget,
        cart_id: CartId,
        init: F,
    ) -> Result<MountedOffer, Arc<ShopifyError>>
    where
        F: Future<Output = Result<UpsellExtension, ShopifyError>>,
    {
        self.mounts
            .try_get_with((target, cart_id), async move { init.await.map(MountedOffer::new) })
            .await
    }

    /// Mount a fresh offer with `init`, replacing any mounted one.
    ///
    /// The replaced offer's liveness is cancelled, so a fetch it still has in
    /// flight is discarded.
    ///
    /// # Errors
    ///
    /// Returns the error `init` failed with. The mounted offer, if any, is
    /// left in place in that case.
    pub async fn remount<F>(
        &self,
        target: ExtensionTarget,
        cart_id: CartId,
        init: F,
    ) -> Result<MountedOffer, ShopifyError>
    where
        F: Future<Output = Result<UpsellExtension, ShopifyError>>,
    {
        let mounted = MountedOffer::new(init.await?);
        let key = (target, cart_id);
        if let Some(previous) = self.mounts.get(&key).await {
            previous.liveness.cancel();
        }
        self.mounts.insert(key, mounted.clone()).await;
        Ok(mounted)
    }

    /// Unmount the offer for this slot and cart. Returns whether one existed.
    pub async fn unmount(&self, target: ExtensionTarget, cart_id: &CartId) -> bool {
        match self.mounts.remove(&(target, cart_id.clone())).await {
            Some(offer) => {
                offer.liveness.cancel();
                true
            }
            None => false,
        }
    }
}
