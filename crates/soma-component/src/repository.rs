//! Repository port for component storage.
//!
//! The framework depends on this trait, not on a concrete store; callers
//! inject whichever implementation fits. The crate's
//! [`testing`](crate::testing) module ships an in-memory reference
//! implementation.
//!
//! # Error Code Convention
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`Duplicate`](RepositoryError::Duplicate) | `REPOSITORY_DUPLICATE` | No |
//! | [`NotFound`](RepositoryError::NotFound) | `REPOSITORY_NOT_FOUND` | No |
//! | [`Storage`](RepositoryError::Storage) | `REPOSITORY_STORAGE` | Yes |

use soma_types::{ComponentId, ErrorCode};
use thiserror::Error;

use crate::Component;

/// Repository layer error.
///
/// `Duplicate` is distinct from `Storage`: the former is a caller mistake,
/// the latter a backend failure that a retry may clear.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// A component with this ID is already saved.
    #[error("component already exists: {0}")]
    Duplicate(ComponentId),

    /// No component with this ID is saved.
    #[error("component not found: {0}")]
    NotFound(ComponentId),

    /// The backing store failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ErrorCode for RepositoryError {
    fn code(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "REPOSITORY_DUPLICATE",
            Self::NotFound(_) => "REPOSITORY_NOT_FOUND",
            Self::Storage(_) => "REPOSITORY_STORAGE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Storage port for components.
///
/// `save` rejects duplicates and leaves the store unchanged on rejection.
pub trait ComponentRepository: Send + Sync {
    /// Saves a component. A second save with the same ID fails with
    /// [`RepositoryError::Duplicate`].
    fn save(&self, component: &Component) -> Result<(), RepositoryError>;

    /// Finds a component by ID.
    fn find_by_id(&self, id: &ComponentId) -> Result<Option<Component>, RepositoryError>;

    /// Returns every saved component.
    fn find_all(&self) -> Result<Vec<Component>, RepositoryError>;

    /// Returns every saved component whose parent is `parent`.
    fn find_children(&self, parent: &ComponentId) -> Result<Vec<Component>, RepositoryError>;

    /// Deletes a component by ID. Unknown IDs fail with
    /// [`RepositoryError::NotFound`].
    fn delete(&self, id: &ComponentId) -> Result<(), RepositoryError>;
}
