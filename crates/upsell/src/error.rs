//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Upstream failures are
//! captured to Sentry before the response is written.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::extension::UnknownTarget;
use crate::shopify::ShopifyError;

/// Application-level error type for the upsell service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Mounting an offer failed. Shared by every request that waited on it.
    #[error("Shopify error: {0}")]
    Mount(Arc<ShopifyError>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<Arc<ShopifyError>> for AppError {
    fn from(err: Arc<ShopifyError>) -> Self {
        Self::Mount(err)
    }
}

impl From<UnknownTarget> for AppError {
    fn from(err: UnknownTarget) -> Self {
        Self::NotFound(err.to_string())
    }
}

impl AppError {
    fn upstream(&self) -> Option<&ShopifyError> {
        match self {
            Self::Shopify(err) => Some(err),
            Self::Mount(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Shopify(_) | Self::Mount(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match (&self, self.upstream()) {
            (_, Some(ShopifyError::NotFound(_))) | (Self::NotFound(_), _) => StatusCode::NOT_FOUND,
            (_, Some(ShopifyError::RateLimited(_))) => StatusCode::TOO_MANY_REQUESTS,
            (_, Some(_)) => StatusCode::BAD_GATEWAY,
            (Self::BadRequest(_), _) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Shopify(_) | Self::Mount(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("upsell", "Offer toggled", Some(&[("cart_id", cart_id.as_str())]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
