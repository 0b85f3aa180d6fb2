//! Core types for the Soma component framework.
//!
//! This crate is the leaf of the Soma workspace. It defines the identity
//! model shared by every other layer:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Soma Workspace                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  soma-types     : ComponentId, Identity, Environment ◄ HERE │
//! │  soma-event     : Event, EventDispatcher                    │
//! │  soma-component : State machine, Component entity           │
//! │  soma-composite : Composite, Machine, cycle validator       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Identity Model
//!
//! Every component is addressed by a [`ComponentId`]: a content-derived
//! SHA-256 digest, formatted as 64 lowercase hex characters. The full
//! [`Identity`] value adds lineage (the ordered list of creation reasons),
//! an optional parent reference, and a dotted hierarchical address:
//!
//! ```text
//! root:        "a1b2c3d4"
//! child:       "a1b2c3d4.9f8e7d6c"
//! grandchild:  "a1b2c3d4.9f8e7d6c.11223344"
//! ```
//!
//! Identities are immutable once created. Parent/child links hold IDs only,
//! never object references, so hierarchy traversal and teardown need no
//! back-pointer bookkeeping.
//!
//! # Error Handling
//!
//! All Soma error types implement [`ErrorCode`] for unified handling:
//!
//! ```
//! use soma_types::{ComponentId, ErrorCode};
//!
//! let err = ComponentId::parse("not-a-digest").unwrap_err();
//! assert_eq!(err.code(), "IDENTITY_MALFORMED_ID");
//! assert!(!err.is_recoverable());
//! ```

mod environment;
mod error;
mod id;
mod identity;

pub use environment::Environment;
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::ComponentId;
pub use identity::{Identity, IdentityError, ParentRef, ADDRESS_DELIMITER};
