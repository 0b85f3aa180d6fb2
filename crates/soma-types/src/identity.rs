//! Component identity: derived ID, lineage, and hierarchical address.
//!
//! # Identity Derivation
//!
//! The unique ID is the SHA-256 digest of the creation reason, the
//! environment fingerprint, an RFC 3339 nanosecond timestamp, and a random
//! nonce. Child derivation additionally feeds the parent's ID into the
//! digest, so siblings created in the same instant cannot collide.
//!
//! ```text
//! adam:  sha256(reason | env.fingerprint | timestamp | nonce)
//! child: sha256(reason | env.fingerprint | timestamp | nonce | parent_id)
//! ```
//!
//! # Hierarchical Addresses
//!
//! Addresses concatenate short IDs from root to self with `.`:
//!
//! ```text
//! adam          "f3a81c09"
//! └── child     "f3a81c09.27b4ee01"
//!     └── child "f3a81c09.27b4ee01.c5d90a12"
//! ```
//!
//! An adam ("root") identity has no parent and exactly one address segment.
//! Every non-root address is its parent's address plus one segment.
//!
//! # Immutability
//!
//! Identities never mutate. Parent links are stored as IDs plus the
//! parent's address, never object references, so hierarchies stay
//! traversable without reference-cycle bookkeeping.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::{ComponentId, Environment, ErrorCode};

/// Delimiter between segments of a hierarchical address.
pub const ADDRESS_DELIMITER: char = '.';

/// Stored reference to a parent identity.
///
/// Holds the parent's raw ID string and address. The ID is re-validated on
/// access (see [`Identity::parent_id`]) because parent references can enter
/// the system through deserialization of stored records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    id: String,
    address: String,
}

impl ParentRef {
    /// Returns the stored (unvalidated) parent ID string.
    #[must_use]
    pub fn raw_id(&self) -> &str {
        &self.id
    }

    /// Returns the parent's hierarchical address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Immutable identity of a component.
///
/// # Example
///
/// ```
/// use soma_types::{Environment, Identity};
///
/// let env = Environment::new();
/// let adam = Identity::adam("data intake", &env).unwrap();
/// let child = Identity::child("parser", &env, &adam).unwrap();
///
/// assert!(adam.is_adam());
/// assert_eq!(adam.address().split('.').count(), 1);
/// assert_eq!(
///     child.address(),
///     format!("{}.{}", adam.address(), child.id().short()),
/// );
/// assert_eq!(child.lineage().last().map(String::as_str), Some("parser"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    id: ComponentId,
    reason: String,
    conceived_at: DateTime<Utc>,
    lineage: Vec<String>,
    parent: Option<ParentRef>,
    address: String,
}

impl Identity {
    /// Creates an adam (root) identity with no parent.
    ///
    /// The lineage is seeded with the creation reason and the address is a
    /// single short-ID segment.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmptyReason`] if the reason is blank.
    pub fn adam(reason: impl Into<String>, environment: &Environment) -> Result<Self, IdentityError> {
        let reason = reason.into();
        validate_reason(&reason)?;

        let conceived_at = Utc::now();
        let id = derive_id(&reason, environment, conceived_at, None);
        let address = id.short().to_string();

        Ok(Self {
            lineage: vec![reason.clone()],
            id,
            reason,
            conceived_at,
            parent: None,
            address,
        })
    }

    /// Creates a child identity under `parent`.
    ///
    /// The child's lineage is the parent's lineage plus the new reason, and
    /// its address extends the parent's by one segment.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmptyReason`] if the reason is blank.
    pub fn child(
        reason: impl Into<String>,
        environment: &Environment,
        parent: &Identity,
    ) -> Result<Self, IdentityError> {
        let reason = reason.into();
        validate_reason(&reason)?;

        let conceived_at = Utc::now();
        let id = derive_id(&reason, environment, conceived_at, Some(parent.id()));
        let address = format!("{}{}{}", parent.address, ADDRESS_DELIMITER, id.short());

        let mut lineage = parent.lineage.clone();
        lineage.push(reason.clone());

        Ok(Self {
            id,
            reason,
            conceived_at,
            lineage,
            parent: Some(ParentRef {
                id: parent.id.as_str().to_string(),
                address: parent.address.clone(),
            }),
            address,
        })
    }

    /// Returns the unique identifier.
    #[must_use]
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    /// Returns the creation reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the conception timestamp.
    #[must_use]
    pub fn conceived_at(&self) -> DateTime<Utc> {
        self.conceived_at
    }

    /// Returns the lineage, oldest reason first.
    #[must_use]
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// Returns the hierarchical address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the stored parent reference, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&ParentRef> {
        self.parent.as_ref()
    }

    /// Resolves the parent's [`ComponentId`].
    ///
    /// Returns `Ok(None)` for adam identities. A stored parent reference
    /// that does not parse as a valid identifier is reported as an explicit
    /// [`IdentityError::MalformedParentReference`] rather than silently
    /// collapsing to "no parent". Malformed references come from corrupted
    /// stored records and callers need to see them.
    pub fn parent_id(&self) -> Result<Option<ComponentId>, IdentityError> {
        match &self.parent {
            None => Ok(None),
            Some(parent) => ComponentId::parse(&parent.id).map(Some).map_err(|_| {
                IdentityError::MalformedParentReference(parent.id.clone())
            }),
        }
    }

    /// Returns `true` if this is an adam (root) identity.
    #[must_use]
    pub fn is_adam(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns `true` if `ancestor` appears on this identity's root path.
    ///
    /// Decided from addresses alone: an ancestor's address is a strict
    /// dotted prefix of its descendants' addresses.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &Identity) -> bool {
        self.address.len() > ancestor.address.len()
            && self.address.starts_with(ancestor.address())
            && self.address[ancestor.address.len()..].starts_with(ADDRESS_DELIMITER)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.address, self.reason)
    }
}

fn validate_reason(reason: &str) -> Result<(), IdentityError> {
    if reason.trim().is_empty() {
        return Err(IdentityError::EmptyReason);
    }
    Ok(())
}

/// Derives a unique component ID.
///
/// The nonce keeps IDs unique even when two creations share a reason,
/// environment, and clock tick.
fn derive_id(
    reason: &str,
    environment: &Environment,
    conceived_at: DateTime<Utc>,
    parent: Option<&ComponentId>,
) -> ComponentId {
    let mut hasher = Sha256::new();
    hasher.update(reason.as_bytes());
    hasher.update(b"-");
    hasher.update(environment.fingerprint().as_bytes());
    hasher.update(b"-");
    hasher.update(
        conceived_at
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
            .as_bytes(),
    );
    hasher.update(b"-");
    hasher.update(Uuid::new_v4().as_bytes());
    if let Some(parent) = parent {
        hasher.update(b"-");
        hasher.update(parent.as_str().as_bytes());
    }
    ComponentId::from_digest(format!("{:x}", hasher.finalize()))
}

/// Identity-layer error.
///
/// | Variant | Code | Recoverable |
/// |---------|------|-------------|
/// | `EmptyReason` | `IDENTITY_EMPTY_REASON` | Yes |
/// | `MalformedId` | `IDENTITY_MALFORMED_ID` | No |
/// | `MalformedParentReference` | `IDENTITY_MALFORMED_PARENT_REFERENCE` | No |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Creation reason was empty or whitespace.
    #[error("creation reason must not be empty")]
    EmptyReason,

    /// String is not a valid 64-character hex identifier.
    #[error("malformed component id: {0:?}")]
    MalformedId(String),

    /// A stored parent reference failed identifier validation.
    ///
    /// Indicates a corrupted stored record, not a root identity.
    #[error("malformed parent reference: {0:?}")]
    MalformedParentReference(String),
}

impl ErrorCode for IdentityError {
    fn code(&self) -> &'static str {
        match self {
            Self::EmptyReason => "IDENTITY_EMPTY_REASON",
            Self::MalformedId(_) => "IDENTITY_MALFORMED_ID",
            Self::MalformedParentReference(_) => "IDENTITY_MALFORMED_PARENT_REFERENCE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyReason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_error_codes;

    fn env() -> Environment {
        Environment::from_parameters([("host", "test")])
    }

    #[test]
    fn adam_has_single_segment_address() {
        let identity = Identity::adam("root purpose", &env()).unwrap();
        assert!(identity.is_adam());
        assert_eq!(identity.address().split('.').count(), 1);
        assert_eq!(identity.address(), identity.id().short());
        assert_eq!(identity.parent_id().unwrap(), None);
    }

    #[test]
    fn identical_inputs_derive_distinct_ids() {
        let shared = env();
        let a = Identity::adam("same reason", &shared).unwrap();
        let b = Identity::adam("same reason", &shared).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn child_address_extends_parent() {
        let environment = env();
        let parent = Identity::adam("parent", &environment).unwrap();
        let child = Identity::child("child", &environment, &parent).unwrap();

        assert_eq!(
            child.address(),
            format!("{}.{}", parent.address(), child.id().short())
        );
        assert_eq!(child.parent_id().unwrap().as_ref(), Some(parent.id()));
    }

    #[test]
    fn lineage_accumulates_root_first() {
        let environment = env();
        let root = Identity::adam("first", &environment).unwrap();
        let mid = Identity::child("second", &environment, &root).unwrap();
        let leaf = Identity::child("third", &environment, &mid).unwrap();

        assert_eq!(leaf.lineage(), &["first", "second", "third"]);
    }

    #[test]
    fn sibling_ids_differ() {
        let environment = env();
        let parent = Identity::adam("parent", &environment).unwrap();
        let a = Identity::child("worker", &environment, &parent).unwrap();
        let b = Identity::child("worker", &environment, &parent).unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn descendant_detection() {
        let environment = env();
        let root = Identity::adam("root", &environment).unwrap();
        let child = Identity::child("child", &environment, &root).unwrap();
        let grandchild = Identity::child("grandchild", &environment, &child).unwrap();
        let other = Identity::adam("other", &environment).unwrap();

        assert!(child.is_descendant_of(&root));
        assert!(grandchild.is_descendant_of(&root));
        assert!(grandchild.is_descendant_of(&child));
        assert!(!root.is_descendant_of(&child));
        assert!(!other.is_descendant_of(&root));
    }

    #[test]
    fn malformed_parent_reference_is_explicit() {
        let environment = env();
        let parent = Identity::adam("parent", &environment).unwrap();
        let child = Identity::child("child", &environment, &parent).unwrap();

        // Corrupt the stored parent reference the way a damaged record
        // would look after deserialization.
        let mut json = serde_json::to_value(&child).unwrap();
        json["parent"]["id"] = serde_json::Value::String("garbage".into());
        let corrupted: Identity = serde_json::from_value(json).unwrap();

        let err = corrupted.parent_id().unwrap_err();
        assert_eq!(err, IdentityError::MalformedParentReference("garbage".into()));
        assert_eq!(err.code(), "IDENTITY_MALFORMED_PARENT_REFERENCE");
    }

    #[test]
    fn empty_reason_rejected() {
        assert!(Identity::adam("  ", &env()).is_err());
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(
            &[
                IdentityError::EmptyReason,
                IdentityError::MalformedId("x".into()),
                IdentityError::MalformedParentReference("x".into()),
            ],
            "IDENTITY_",
        );
    }
}
