//! Cart lines and the cart changes the offer can request.

use serde::{Deserialize, Serialize};

use super::id::{CartLineId, ProductVariantId};

/// The purchasable item a cart line points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchandise {
    /// Product variant ID.
    pub id: ProductVariantId,
}

/// One entry in the shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: CartLineId,
    /// Units of the merchandise on this line.
    pub quantity: u32,
    /// Merchandise on this line.
    pub merchandise: Merchandise,
}

impl CartLine {
    /// Create a cart line for a variant.
    #[must_use]
    pub fn new(id: CartLineId, merchandise_id: ProductVariantId, quantity: u32) -> Self {
        Self {
            id,
            quantity,
            merchandise: Merchandise { id: merchandise_id },
        }
    }
}

/// The most recently added line: the last element of the ordered sequence.
#[must_use]
pub fn last_added(lines: &[CartLine]) -> Option<&CartLine> {
    lines.last()
}

/// Find the first line holding the given merchandise.
#[must_use]
pub fn find_by_merchandise<'a>(
    lines: &'a [CartLine],
    merchandise_id: &ProductVariantId,
) -> Option<&'a CartLine> {
    lines
        .iter()
        .find(|line| &line.merchandise.id == merchandise_id)
}

/// A single cart mutation request.
///
/// Serializes to the host's change shape, e.g.
/// `{"type":"addCartLine","merchandiseId":"...","quantity":1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CartLineChange {
    /// Add units of a variant as a new (or merged) line.
    AddCartLine {
        merchandise_id: ProductVariantId,
        quantity: u32,
    },
    /// Remove units from an existing line.
    RemoveCartLine { id: CartLineId, quantity: u32 },
}
