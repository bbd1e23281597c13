//! Platform customer identifiers.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of a Shopify customer global ID.
pub const CUSTOMER_GID_PREFIX: &str = "gid://shopify/Customer/";

/// Opaque identifier of a customer record owned by the platform.
///
/// The REST API hands out numeric ids while GraphQL wants global ids, so the
/// raw value is kept as text and converted with [`CustomerId::to_gid`].
/// Deserializes from either a JSON number or a JSON string.
///
/// ```
/// use archetype_sync_core::CustomerId;
///
/// let id = CustomerId::new("207119551");
/// assert_eq!(id.to_gid(), "gid://shopify/Customer/207119551");
///
/// let gid = CustomerId::new("gid://shopify/Customer/1");
/// assert_eq!(gid.to_gid(), "gid://shopify/Customer/1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier as a GraphQL global ID.
    #[must_use]
    pub fn to_gid(&self) -> String {
        if self.0.starts_with("gid://") {
            self.0.clone()
        } else {
            format!("{CUSTOMER_GID_PREFIX}{}", self.0)
        }
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for CustomerId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for CustomerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::from(n)),
            Raw::Text(s) if !s.trim().is_empty() => Ok(Self(s)),
            Raw::Text(_) => Err(serde::de::Error::custom("customer id cannot be empty")),
        }
    }
}
