//! Core types for the checkout upsell offer.
//!
//! This module provides type-safe wrappers for the domain concepts the offer
//! passes between the catalog, the cart and the renderer.

pub mod cart;
pub mod id;
pub mod price;
pub mod summary;

pub use cart::{CartLine, CartLineChange, Merchandise};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use summary::VariantSummary;
