//! Domain types exchanged with the Shopify Admin API.
//!
//! These are decoupled from the generated GraphQL types and the REST wire
//! shapes so the sync pipeline never depends on either.

use archetype_sync_core::{CustomerId, Email, MetafieldKey, MetafieldType};
use serde::{Deserialize, Serialize};

// =============================================================================
// Customer Types
// =============================================================================

/// A customer as returned by the REST customer endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Platform customer ID (numeric in REST responses).
    pub id: CustomerId,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Input for creating a customer that the quiz has not seen before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    /// Email address (required).
    pub email: Email,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

impl NewCustomer {
    /// A customer with only an email address.
    #[must_use]
    pub const fn with_email(email: Email) -> Self {
        Self {
            email,
            first_name: None,
            last_name: None,
            phone: None,
        }
    }
}

// =============================================================================
// Metafield Types
// =============================================================================

/// A metafield as echoed back by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metafield {
    /// Metafield global ID (absent when echoing an unsaved input).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Namespace for grouping metafields.
    pub namespace: String,
    /// Key within the namespace.
    pub key: String,
    /// The stored value.
    pub value: String,
    /// The metafield type (e.g., `single_line_text_field`).
    #[serde(rename = "type")]
    pub type_: String,
}

/// Input for setting a metafield on a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetafieldInput {
    /// Namespace and key.
    pub target: MetafieldKey,
    /// The value to store, sent unmodified.
    pub value: String,
    /// The metafield type.
    pub kind: MetafieldType,
}

impl MetafieldInput {
    /// A single-line text metafield.
    #[must_use]
    pub fn text(target: MetafieldKey, value: impl Into<String>) -> Self {
        Self {
            target,
            value: value.into(),
            kind: MetafieldType::SingleLineTextField,
        }
    }

    /// The metafield this input would produce, for echoing when the platform
    /// returns none.
    #[must_use]
    pub fn to_metafield(&self) -> Metafield {
        Metafield {
            id: None,
            namespace: self.target.namespace().to_string(),
            key: self.target.key().to_string(),
            value: self.value.clone(),
            type_: self.kind.as_str().to_string(),
        }
    }
}

/// A field-level error reported by a mutation (`userErrors`), kept as the
/// platform sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Path to the offending input field, if any.
    #[serde(default)]
    pub field: Vec<String>,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable error code (e.g., `INVALID_VALUE`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Index of the offending input in the mutation's list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_index: Option<i64>,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field.join("."), self.message)
        }
    }
}

/// Outcome of a `metafieldsSet` mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetafieldsSetResult {
    /// Metafields the platform reports as set.
    pub metafields: Vec<Metafield>,
    /// Every user error, in the order returned.
    pub user_errors: Vec<FieldError>,
}
