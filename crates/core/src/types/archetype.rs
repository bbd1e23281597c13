//! Quiz archetype value written to the customer metafield.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The archetype classification produced by the quiz.
///
/// A missing or blank archetype never fails a sync; it is replaced by
/// [`Archetype::UNKNOWN`]. A non-blank value is stored exactly as received,
/// including quotes, backslashes, and line breaks.
///
/// ```
/// use archetype_sync_core::Archetype;
///
/// assert_eq!(Archetype::from_input(None).as_str(), "Unknown");
/// assert_eq!(Archetype::from_input(Some("   ")).as_str(), "Unknown");
/// assert_eq!(Archetype::from_input(Some("Visionary")).as_str(), "Visionary");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Archetype(String);

impl Archetype {
    /// Value written when the caller sends no usable archetype.
    pub const UNKNOWN: &'static str = "Unknown";

    /// Build the archetype from optional request input.
    #[must_use]
    pub fn from_input(input: Option<&str>) -> Self {
        match input {
            Some(value) if !value.trim().is_empty() => Self(value.to_owned()),
            _ => Self::unknown(),
        }
    }

    /// The `"Unknown"` fallback.
    #[must_use]
    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_owned())
    }

    /// Whether this is the fallback value.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    /// Returns the archetype as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Archetype {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
