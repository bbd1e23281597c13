//! Unified error handling for the sync endpoint.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::ALLOW},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::shopify::{FieldError, ShopifyError};

/// The upstream call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    /// Customer search by email.
    Search,
    /// Customer creation.
    Create,
    /// `metafieldsSet` mutation.
    SetMetafield,
}

impl SyncStage {
    /// Stable name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Create => "create",
            Self::SetMetafield => "set_metafield",
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::Search => "Customer search failed",
            Self::Create => "Customer creation failed",
            Self::SetMetafield => "Metafield update failed",
        }
    }
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the sync endpoint.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Anything other than POST.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Missing or invalid input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// App Proxy signature missing or invalid.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// No customer for the email, and creation is disabled.
    #[error("Customer not found: {0}")]
    NotFound(String),

    /// Shopify failed or answered with something unusable.
    #[error("Shopify {stage} failed: {source}")]
    Upstream {
        /// Which call failed.
        stage: SyncStage,
        /// What Shopify (or the transport) reported.
        source: ShopifyError,
    },

    /// Shopify rejected the metafield with field-level errors.
    #[error("Metafield rejected: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Unexpected failure, e.g. the service is misconfigured.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Wrap an upstream failure with the stage it happened in.
    #[must_use]
    pub const fn upstream(stage: SyncStage, source: ShopifyError) -> Self {
        Self::Upstream { stage, source }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `{ error, details? }` body for this error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        match self {
            Self::MethodNotAllowed => ErrorBody::new("Method not allowed"),
            Self::BadRequest(message) | Self::Unauthorized(message) | Self::NotFound(message) => {
                ErrorBody::new(message.clone())
            }
            Self::Upstream { stage, source } => ErrorBody::new(stage.description())
                .with_details(serde_json::Value::String(source.to_string())),
            Self::Validation(errors) => ErrorBody::new("Metafield validation failed")
                .with_details(serde_json::to_value(errors).unwrap_or_default()),
            // Don't expose internal error details to clients
            Self::Internal(_) => ErrorBody::new("Internal server error"),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Human-readable summary.
    pub error: String,
    /// Diagnostic payload (raw upstream text or field errors).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server errors go to Sentry; client errors are only logged
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Sync request failed"
            );
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Sync request rejected");
        }

        let mut response = (status, Json(self.body())).into_response();

        if matches!(self, Self::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST"));
        }

        response
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
