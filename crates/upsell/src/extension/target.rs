//! Checkout render slots the offer can be mounted in.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Named insertion point in the checkout page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionTarget {
    /// After the list of cart lines.
    CartLineListRenderAfter,
}

impl ExtensionTarget {
    pub const ALL: [Self; 1] = [Self::CartLineListRenderAfter];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CartLineListRenderAfter => "purchase.checkout.cart-line-list.render-after",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown extension target: {0}")]
pub struct UnknownTarget(pub String);

impl FromStr for ExtensionTarget {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|target| target.as_str() == s)
            .ok_or_else(|| UnknownTarget(s.to_string()))
    }
}

impl fmt::Display for ExtensionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
