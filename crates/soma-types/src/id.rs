//! Component identifier type.
//!
//! A [`ComponentId`] is the 64-character lowercase hex form of a SHA-256
//! digest derived at component creation. The digest input salts the creation
//! reason with the environment fingerprint, a nanosecond timestamp, and a
//! random nonce, so two creation calls never collide even when their inputs
//! are identical (see [`Identity`](crate::Identity)).

use serde::{Deserialize, Serialize};

use crate::identity::IdentityError;

/// Length of a full component identifier (hex-encoded SHA-256).
pub(crate) const ID_LEN: usize = 64;

/// Length of the short form used in hierarchical addresses and diagnostics.
pub(crate) const SHORT_LEN: usize = 8;

/// Identifier for a component, composite, or machine.
///
/// Wraps the hex digest string with validated construction. Equality and
/// ordering are plain string comparison.
///
/// # Example
///
/// ```
/// use soma_types::ComponentId;
///
/// let id = ComponentId::parse(&"ab".repeat(32)).unwrap();
/// assert_eq!(id.short(), "abababab");
/// assert_eq!(id.as_str().len(), 64);
///
/// assert!(ComponentId::parse("nope").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentId(String);

impl ComponentId {
    /// Parses a raw identifier string.
    ///
    /// Uppercase hex is normalized to lowercase. Anything that is not a
    /// 64-character hex string is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MalformedId`] for invalid input.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        if raw.len() != ID_LEN || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdentityError::MalformedId(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_lowercase()))
    }

    /// Wraps a digest string produced by identity derivation.
    ///
    /// Callers outside the crate go through [`parse`](Self::parse).
    pub(crate) fn from_digest(hex: String) -> Self {
        debug_assert_eq!(hex.len(), ID_LEN);
        Self(hex)
    }

    /// Returns the full 64-character identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the 8-character short form.
    ///
    /// Short IDs are the segments of hierarchical addresses and the form
    /// used in error messages and cycle paths.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..SHORT_LEN]
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ComponentId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ComponentId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ComponentId> for String {
    fn from(id: ComponentId) -> Self {
        id.0
    }
}
