//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{ConfigError, UpsellConfig};
use crate::mounts::MountRegistry;
use crate::shopify::StorefrontClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: UpsellConfig,
    storefront: StorefrontClient,
    mounts: MountRegistry,
}

impl AppState {
    /// Create application state with a Storefront client for the configured store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the store domain does not form a valid endpoint.
    pub fn new(config: UpsellConfig) -> Result<Self, ConfigError> {
        let storefront = StorefrontClient::new(&config.shopify)?;
        Ok(Self::with_client(config, storefront))
    }

    /// Create application state around an existing client.
    #[must_use]
    pub fn with_client(config: UpsellConfig, storefront: StorefrontClient) -> Self {
        let mounts = MountRegistry::new(config.mounts);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                mounts,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &UpsellConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    #[must_use]
    pub fn mounts(&self) -> &MountRegistry {
        &self.inner.mounts
    }
}
