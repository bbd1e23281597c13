//! Metafield target (namespace + key) and value type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Default namespace for the archetype metafield.
pub const DEFAULT_NAMESPACE: &str = "dearmykelexperience";

/// Default key for the archetype metafield.
pub const DEFAULT_KEY: &str = "archetype";

/// Errors that can occur when building a [`MetafieldKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MetafieldKeyError {
    /// Namespace length outside the platform's limits.
    #[error("metafield namespace must be {min}-{max} characters (got {len})")]
    NamespaceLength {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
        /// Actual length.
        len: usize,
    },
    /// Key length outside the platform's limits.
    #[error("metafield key must be {min}-{max} characters (got {len})")]
    KeyLength {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
        /// Actual length.
        len: usize,
    },
    /// A character other than ASCII alphanumerics, `-` or `_`.
    #[error("metafield {field} contains invalid character {ch:?}")]
    InvalidCharacter {
        /// Which part was invalid (`namespace` or `key`).
        field: &'static str,
        /// The offending character.
        ch: char,
    },
}

/// Where the archetype is stored on the customer: `namespace.key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetafieldKey {
    namespace: String,
    key: String,
}

impl MetafieldKey {
    const NAMESPACE_LEN: (usize, usize) = (3, 255);
    const KEY_LEN: (usize, usize) = (2, 64);

    /// Build a validated namespace/key pair.
    ///
    /// # Errors
    ///
    /// Returns an error if either part is outside the platform's length
    /// limits or contains characters other than `[A-Za-z0-9_-]`.
    pub fn new(namespace: &str, key: &str) -> Result<Self, MetafieldKeyError> {
        let namespace = namespace.trim();
        let key = key.trim();

        let (min, max) = Self::NAMESPACE_LEN;
        if !(min..=max).contains(&namespace.len()) {
            return Err(MetafieldKeyError::NamespaceLength {
                min,
                max,
                len: namespace.len(),
            });
        }
        check_characters("namespace", namespace)?;

        let (min, max) = Self::KEY_LEN;
        if !(min..=max).contains(&key.len()) {
            return Err(MetafieldKeyError::KeyLength {
                min,
                max,
                len: key.len(),
            });
        }
        check_characters("key", key)?;

        Ok(Self {
            namespace: namespace.to_owned(),
            key: key.to_owned(),
        })
    }

    /// The metafield namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The metafield key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Default for MetafieldKey {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            key: DEFAULT_KEY.to_owned(),
        }
    }
}

impl fmt::Display for MetafieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.key)
    }
}

fn check_characters(field: &'static str, value: &str) -> Result<(), MetafieldKeyError> {
    match value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        Some(ch) => Err(MetafieldKeyError::InvalidCharacter { field, ch }),
        None => Ok(()),
    }
}

/// Metafield content types written by this system.
///
/// Only single-line text is ever written; the enum keeps the wire name in
/// one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetafieldType {
    /// `single_line_text_field`
    #[default]
    SingleLineTextField,
}

impl MetafieldType {
    /// The platform's name for this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleLineTextField => "single_line_text_field",
        }
    }
}

impl fmt::Display for MetafieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target() {
        let target = MetafieldKey::default();
        assert_eq!(target.to_string(), "dearmykelexperience.archetype");
        assert_eq!(
            MetafieldKey::new(DEFAULT_NAMESPACE, DEFAULT_KEY).unwrap(),
            target
        );
    }

    #[test]
    fn test_trims_parts() {
        let target = MetafieldKey::new(" quiz_results ", " result-v2 ").unwrap();
        assert_eq!(target.namespace(), "quiz_results");
        assert_eq!(target.key(), "result-v2");
    }

    #[test]
    fn test_length_limits() {
        assert!(matches!(
            MetafieldKey::new("ab", "archetype"),
            Err(MetafieldKeyError::NamespaceLength { len: 2, .. })
        ));
        assert!(matches!(
            MetafieldKey::new("custom", "a"),
            Err(MetafieldKeyError::KeyLength { len: 1, .. })
        ));
        assert!(matches!(
            MetafieldKey::new("custom", &"k".repeat(65)),
            Err(MetafieldKeyError::KeyLength { len: 65, .. })
        ));
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            MetafieldKey::new("my.namespace", "archetype"),
            Err(MetafieldKeyError::InvalidCharacter {
                field: "namespace",
                ch: '.'
            })
        );
        assert_eq!(
            MetafieldKey::new("custom", "arche type"),
            Err(MetafieldKeyError::InvalidCharacter {
                field: "key",
                ch: ' '
            })
        );
    }

    #[test]
    fn test_metafield_type_wire_name() {
        assert_eq!(
            MetafieldType::SingleLineTextField.as_str(),
            "single_line_text_field"
        );
        assert_eq!(
            serde_json::to_string(&MetafieldType::default()).unwrap(),
            "\"single_line_text_field\""
        );
    }
}
