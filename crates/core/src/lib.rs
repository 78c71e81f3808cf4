//! Checkout Upsell Core - Shared types library.
//!
//! This crate provides the domain types used across the checkout upsell
//! components:
//! - `upsell` - Offer component, Shopify client and HTTP surface
//! - `integration-tests` - End-to-end tests against a mocked Storefront API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for Shopify GIDs, prices, cart lines and
//!   the variant summary the offer displays

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
