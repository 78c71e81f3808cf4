//! Recommendation resolution.
//!
//! Reads the complementary-products metafield of the last-added variant's
//! product and picks the first candidate. Anything unusable in the metafield
//! falls back to the configured product; a failed or empty query does not.

use checkout_upsell_core::{ProductId, ProductVariantId};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::api::CatalogApi;
use super::machine::{Resolution, ResolutionSource, StallReason};
use crate::config::ExtensionSettings;

/// One top-level entry of the metafield value.
///
/// Search & Discovery writes a flat list of product GIDs; some stores carry
/// a nested list whose inner lists hold the GIDs.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Candidate {
    Id(String),
    Group(Vec<String>),
}

/// First product GID named by a raw metafield value.
///
/// Returns `None` for blank, malformed or empty values.
#[must_use]
pub fn first_candidate(raw: &str) -> Option<ProductId> {
    let candidates: Vec<Candidate> = match serde_json::from_str(raw) {
        Ok(candidates) => candidates,
        Err(e) => {
            if !raw.trim().is_empty() {
                warn!(error = %e, "Unparseable complementary products metafield");
            }
            return None;
        }
    };

    let id = match candidates.into_iter().next()? {
        Candidate::Id(id) => id,
        Candidate::Group(group) => group.into_iter().next()?,
    };

    let id = id.trim();
    (!id.is_empty()).then(|| ProductId::new(id))
}

/// Resolve which product to recommend for a variant.
///
/// # Errors
///
/// Returns a `StallReason` when the metafield query fails or the variant
/// resolves to no node. Neither case falls back.
#[instrument(skip(catalog, settings), fields(variant_id = %variant_id))]
pub async fn resolve(
    catalog: &dyn CatalogApi,
    variant_id: &ProductVariantId,
    settings: &ExtensionSettings,
) -> Result<Resolution, StallReason> {
    let metafields = catalog
        .complementary_products(variant_id)
        .await
        .map_err(|e| {
            warn!(error = %e, "Complementary products query failed");
            StallReason::QueryFailed(e.to_string())
        })?
        .ok_or_else(|| {
            warn!("Variant resolved to no node");
            StallReason::NodeNotFound(variant_id.to_string())
        })?;

    let resolution = match metafields.first_value().and_then(first_candidate) {
        Some(product_id) => Resolution {
            product_id,
            source: ResolutionSource::Metafield,
        },
        None => Resolution {
            product_id: settings.fallback_product_id(),
            source: ResolutionSource::Fallback,
        },
    };

    debug!(
        product_id = %resolution.product_id,
        source = ?resolution.source,
        "Resolved recommendation"
    );
    Ok(resolution)
}
