//! The complementary-product offer.
//!
//! # Pipeline
//!
//! 1. [`resolver`] - last-added variant to recommended product ID
//! 2. [`loader`] - product ID to [`VariantSummary`](checkout_upsell_core::VariantSummary)
//! 3. [`view`] - summary to HTML fragment
//! 4. [`cart_sync`] - selection toggle to cart change
//!
//! [`UpsellExtension`] owns one run of the pipeline per mount and tracks it as
//! an explicit [`UpsellPhase`].

mod api;
pub mod cart_sync;
mod component;
pub mod loader;
pub mod machine;
pub mod resolver;
mod target;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{CartApi, CatalogApi};
pub use cart_sync::CartSync;
pub use component::UpsellExtension;
pub use machine::{Resolution, ResolutionSource, Stage, StallReason, UpsellPhase};
pub use target::{ExtensionTarget, UnknownTarget};
pub use view::{OfferTemplate, OfferView};
