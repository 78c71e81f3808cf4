//! Newtype IDs for Shopify global identifiers.
//!
//! Shopify addresses every object with an opaque global ID (GID) such as
//! `gid://shopify/Product/8992711246105`. Use the `define_gid!` macro to create
//! type-safe wrappers that prevent accidentally passing a variant ID where a
//! product ID is expected.

/// Macro to define a type-safe Shopify GID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use checkout_upsell_core::define_gid;
/// define_gid!(ProductId);
/// define_gid!(CollectionId);
///
/// let product = ProductId::new("gid://shopify/Product/1");
/// assert_eq!(product.as_str(), "gid://shopify/Product/1");
///
/// // These are different types, so this won't compile:
/// // let _: CollectionId = product;
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying GID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_gid!(ProductId);
define_gid!(ProductVariantId);
define_gid!(CartLineId);
define_gid!(CartId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_is_transparent() {
        let id = ProductVariantId::new("gid://shopify/ProductVariant/1");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"gid://shopify/ProductVariant/1\"");
    }
}
