//! Explicit lifecycle of a mounted offer.
//!
//! ```text
//! Idle -> ResolutionPending -> Resolved -> LoadPending -> Ready
//!               |                              |
//!               +---------> Stalled <----------+
//! ```
//!
//! Only `Ready` renders. `Stalled` is terminal for the mount and records the
//! stage and reason a fetch halted forward progress.

use std::fmt;

use checkout_upsell_core::{ProductId, ProductVariantId, VariantSummary};
use thiserror::Error;

/// Where the recommended product ID came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// First candidate of the complementary-products metafield.
    Metafield,
    /// Merchant-configured or built-in fallback.
    Fallback,
}

/// Outcome of the resolver stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub product_id: ProductId,
    pub source: ResolutionSource,
}

/// Pipeline stage a fetch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolution,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolution => "resolution",
            Self::Load => "load",
        })
    }
}

/// Why a stage could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StallReason {
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("no node for {0}")]
    NodeNotFound(String),
    #[error("product {0} not found")]
    ProductNotFound(String),
    #[error("product {0} has no variants")]
    NoVariants(String),
}

/// Lifecycle state of one mounted offer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpsellPhase {
    /// Mounted, nothing requested yet (or the cart was empty at mount).
    #[default]
    Idle,
    /// Metafield query for the last-added variant is in flight.
    ResolutionPending { variant_id: ProductVariantId },
    /// A product to recommend is known.
    Resolved(Resolution),
    /// Product query for the recommendation is in flight.
    LoadPending(Resolution),
    /// Everything needed to render is loaded.
    Ready {
        recommendation: Resolution,
        summary: VariantSummary,
    },
    /// A fetch failed; the offer stays hidden for the rest of this mount.
    Stalled { stage: Stage, reason: StallReason },
}

impl UpsellPhase {
    /// Short state name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ResolutionPending { .. } => "resolution_pending",
            Self::Resolved(_) => "resolved",
            Self::LoadPending(_) => "load_pending",
            Self::Ready { .. } => "ready",
            Self::Stalled { .. } => "stalled",
        }
    }

    /// The loaded summary, available only once `Ready`.
    #[must_use]
    pub const fn summary(&self) -> Option<&VariantSummary> {
        match self {
            Self::Ready { summary, .. } => Some(summary),
            _ => None,
        }
    }

    /// The resolved recommendation, once resolution has completed.
    #[must_use]
    pub const fn recommendation(&self) -> Option<&Resolution> {
        match self {
            Self::Resolved(r) | Self::LoadPending(r) => Some(r),
            Self::Ready { recommendation, .. } => Some(recommendation),
            _ => None,
        }
    }
}
