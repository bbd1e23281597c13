//! Parsing of the inbound sync payload.

use archetype_sync_core::{Archetype, Email};
use serde::{Deserialize, Deserializer};

use crate::error::SyncError;
use crate::shopify::NewCustomer;

/// Raw JSON body as posted by the quiz.
///
/// Every field is optional here; [`SyncRequest::from_payload`] decides what
/// is actually required. Optional fields that arrive as something other than
/// a string are treated as absent, so `"archetype": 3` stores `"Unknown"`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SyncPayload {
    /// Customer email (required).
    pub email: Option<String>,
    /// Quiz result; blank means "Unknown".
    #[serde(deserialize_with = "text_or_none")]
    pub archetype: Option<String>,
    /// First name, used only when creating.
    #[serde(alias = "firstName", deserialize_with = "text_or_none")]
    pub first_name: Option<String>,
    /// Last name, used only when creating.
    #[serde(alias = "lastName", deserialize_with = "text_or_none")]
    pub last_name: Option<String>,
    /// Phone, used only when creating.
    #[serde(deserialize_with = "text_or_none")]
    pub phone: Option<String>,
}

/// A validated sync request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Normalized email.
    pub email: Email,
    /// Archetype to store.
    pub archetype: Archetype,
    /// First name for a new customer.
    pub first_name: Option<String>,
    /// Last name for a new customer.
    pub last_name: Option<String>,
    /// Phone for a new customer.
    pub phone: Option<String>,
}

impl SyncRequest {
    /// Parse a request body.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::BadRequest` if the body is not a JSON object or
    /// does not carry a usable email.
    pub fn from_json(body: &[u8]) -> Result<Self, SyncError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(SyncError::BadRequest("Missing email.".to_string()));
        }

        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| SyncError::BadRequest(format!("Invalid JSON body: {e}")))?;

        if !value.is_object() {
            return Err(SyncError::BadRequest(
                "Request body must be a JSON object.".to_string(),
            ));
        }

        let payload: SyncPayload = serde_json::from_value(value)
            .map_err(|e| SyncError::BadRequest(format!("Invalid request body: {e}")))?;

        Self::from_payload(payload)
    }

    /// Validate a decoded payload.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::BadRequest` if the email is missing, blank, or
    /// malformed.
    pub fn from_payload(payload: SyncPayload) -> Result<Self, SyncError> {
        let raw_email = payload
            .email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SyncError::BadRequest("Missing email.".to_string()))?;

        let email = Email::parse(raw_email)
            .map_err(|e| SyncError::BadRequest(format!("Invalid email: {e}")))?;

        Ok(Self {
            email,
            archetype: Archetype::from_input(payload.archetype.as_deref()),
            first_name: non_blank(payload.first_name),
            last_name: non_blank(payload.last_name),
            phone: non_blank(payload.phone),
        })
    }

    /// The customer to create when none exists for this email.
    #[must_use]
    pub fn new_customer(&self) -> NewCustomer {
        NewCustomer {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Deserialize a JSON string as `Some`, and any other value as `None`.
fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<SyncRequest, SyncError> {
        SyncRequest::from_json(body.as_bytes())
    }

    #[test]
    fn test_full_payload() {
        let request = parse(
            r#"{"email": " Ada@Example.com ", "archetype": "Visionary",
                "first_name": "Ada", "last_name": "Lovelace", "phone": "+15551234567"}"#,
        )
        .unwrap();

        assert_eq!(request.email.as_str(), "Ada@Example.com");
        assert_eq!(request.archetype.as_str(), "Visionary");
        assert_eq!(request.first_name.as_deref(), Some("Ada"));
        assert_eq!(request.phone.as_deref(), Some("+15551234567"));
    }

    #[test]
    fn test_camel_case_names_accepted() {
        let request = parse(r#"{"email": "a@example.com", "firstName": "Ada", "lastName": "L"}"#)
            .unwrap();
        assert_eq!(request.first_name.as_deref(), Some("Ada"));
        assert_eq!(request.last_name.as_deref(), Some("L"));
    }

    #[test]
    fn test_missing_archetype_defaults_to_unknown() {
        for body in [
            r#"{"email": "a@example.com"}"#,
            r#"{"email": "a@example.com", "archetype": null}"#,
            r#"{"email": "a@example.com", "archetype": ""}"#,
            r#"{"email": "a@example.com", "archetype": "   "}"#,
            r#"{"email": "a@example.com", "archetype": 42}"#,
            r#"{"email": "a@example.com", "archetype": ["Visionary"]}"#,
            r#"{"email": "a@example.com", "archetype": {"name": "Visionary"}}"#,
            r#"{"email": "a@example.com", "archetype": true}"#,
        ] {
            assert!(parse(body).unwrap().archetype.is_unknown(), "{body}");
        }
    }

    #[test]
    fn test_missing_email_is_bad_request() {
        for body in [
            "",
            "  ",
            "{}",
            r#"{"archetype": "Visionary", "first_name": "Ada"}"#,
            r#"{"email": null}"#,
            r#"{"email": "   "}"#,
        ] {
            let err = parse(body).unwrap_err();
            assert!(matches!(err, SyncError::BadRequest(_)), "{body}: {err:?}");
        }
    }

    #[test]
    fn test_malformed_bodies_are_bad_request() {
        for body in [
            "not json",
            "[]",
            r#""a@example.com""#,
            r#"{"email": 42}"#,
            r#"{"email": "no-at-sign"}"#,
        ] {
            let err = parse(body).unwrap_err();
            assert!(matches!(err, SyncError::BadRequest(_)), "{body}: {err:?}");
        }
    }

    #[test]
    fn test_non_string_contact_fields_dropped() {
        let request = parse(
            r#"{"email": "a@example.com", "archetype": "Visionary",
                "first_name": 7, "lastName": {"x": 1}, "phone": 15551234567}"#,
        )
        .unwrap();

        assert_eq!(request.archetype.as_str(), "Visionary");
        assert!(request.first_name.is_none());
        assert!(request.last_name.is_none());
        assert!(request.phone.is_none());
    }

    #[test]
    fn test_blank_names_dropped() {
        let request = parse(r#"{"email": "a@example.com", "first_name": "  ", "phone": ""}"#).unwrap();
        assert!(request.first_name.is_none());
        assert!(request.phone.is_none());

        let customer = request.new_customer();
        assert_eq!(customer.email.as_str(), "a@example.com");
        assert!(customer.first_name.is_none());
    }
}
