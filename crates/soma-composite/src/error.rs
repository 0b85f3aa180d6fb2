//! Composition layer errors.
//!
//! # Error Code Convention
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`NonExistentReference`](ConnectionError::NonExistentReference) | `CONNECTION_NONEXISTENT_REFERENCE` | Yes |
//! | [`CycleDetected`](ConnectionError::CycleDetected) | `CONNECTION_CYCLE_DETECTED` | Yes |
//! | [`InitializationFailed`](CompositeError::InitializationFailed) | `COMPOSITE_INITIALIZATION_FAILED` | No |
//! | [`DuplicateComponent`](CompositeError::DuplicateComponent) | `COMPOSITE_DUPLICATE_COMPONENT` | No |
//! | [`InvalidOperation`](CompositeError::InvalidOperation) | `COMPOSITE_INVALID_OPERATION` | Yes |
//! | [`InitializationFailed`](MachineError::InitializationFailed) | `MACHINE_INITIALIZATION_FAILED` | No |
//! | [`DuplicateComposite`](MachineError::DuplicateComposite) | `MACHINE_DUPLICATE_COMPOSITE` | No |
//! | [`CompositeNotFound`](MachineError::CompositeNotFound) | `MACHINE_COMPOSITE_NOT_FOUND` | No |
//!
//! Connection errors are recoverable in the sense that the caller can
//! request a different, legal edge. Wrapper variants delegate to the
//! wrapped error's code.

use soma_component::ComponentError;
use soma_types::{ComponentId, ErrorCode};
use thiserror::Error;

/// Connection validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// One endpoint of the requested connection is not a member of the
    /// container.
    #[error("{operation} in {container:?} refers to unknown member {missing}")]
    NonExistentReference {
        operation: String,
        container: String,
        missing: ComponentId,
    },

    /// The requested edge would close a directed cycle. `path` walks the
    /// loop that would form, starting and ending at `origin`. The field is
    /// not named `source` because thiserror reserves that name for the
    /// error-chaining accessor.
    #[error("connection {origin} -> {target} would create a cycle")]
    CycleDetected {
        origin: ComponentId,
        target: ComponentId,
        path: Vec<ComponentId>,
    },
}

impl ErrorCode for ConnectionError {
    fn code(&self) -> &'static str {
        match self {
            Self::NonExistentReference { .. } => "CONNECTION_NONEXISTENT_REFERENCE",
            Self::CycleDetected { .. } => "CONNECTION_CYCLE_DETECTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}

/// Composite layer error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeError {
    /// The composite could not reach its ready state during construction.
    #[error("composite initialization failed: {0}")]
    InitializationFailed(String),

    /// A member with this ID is already present.
    #[error("component already in composite: {0}")]
    DuplicateComponent(ComponentId),

    /// The operation is not legal in the composite's current state.
    #[error("cannot {operation} while composite is {state:?}")]
    InvalidOperation {
        operation: String,
        state: soma_component::State,
    },

    /// A requested connection was rejected.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A state transition on the composite itself was rejected.
    #[error(transparent)]
    Transition(#[from] ComponentError),
}

impl ErrorCode for CompositeError {
    fn code(&self) -> &'static str {
        match self {
            Self::InitializationFailed(_) => "COMPOSITE_INITIALIZATION_FAILED",
            Self::DuplicateComponent(_) => "COMPOSITE_DUPLICATE_COMPONENT",
            Self::InvalidOperation { .. } => "COMPOSITE_INVALID_OPERATION",
            Self::Connection(err) => err.code(),
            Self::Transition(err) => err.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::InitializationFailed(_) | Self::DuplicateComponent(_) => false,
            Self::InvalidOperation { .. } => true,
            Self::Connection(err) => err.is_recoverable(),
            Self::Transition(err) => err.is_recoverable(),
        }
    }
}

/// Machine layer error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// The machine could not reach its ready state during construction.
    #[error("machine initialization failed: {0}")]
    InitializationFailed(String),

    /// A composite with this ID is already registered.
    #[error("composite already in machine: {0}")]
    DuplicateComposite(ComponentId),

    /// No composite with this ID is registered.
    #[error("composite not found in machine: {0}")]
    CompositeNotFound(ComponentId),

    /// The operation is not legal in the machine's current state.
    #[error("cannot {operation} while machine is {state:?}")]
    InvalidOperation {
        operation: String,
        state: soma_component::State,
    },

    /// A requested connection was rejected.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A state transition on the machine itself was rejected.
    #[error(transparent)]
    Transition(#[from] ComponentError),
}

impl ErrorCode for MachineError {
    fn code(&self) -> &'static str {
        match self {
            Self::InitializationFailed(_) => "MACHINE_INITIALIZATION_FAILED",
            Self::DuplicateComposite(_) => "MACHINE_DUPLICATE_COMPOSITE",
            Self::CompositeNotFound(_) => "MACHINE_COMPOSITE_NOT_FOUND",
            Self::InvalidOperation { .. } => "MACHINE_INVALID_OPERATION",
            Self::Connection(err) => err.code(),
            Self::Transition(err) => err.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::InitializationFailed(_)
            | Self::DuplicateComposite(_)
            | Self::CompositeNotFound(_) => false,
            Self::InvalidOperation { .. } => true,
            Self::Connection(err) => err.is_recoverable(),
            Self::Transition(err) => err.is_recoverable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soma_types::{assert_error_code, assert_error_codes};

    fn id(byte: &str) -> ComponentId {
        ComponentId::parse(&byte.repeat(32)).unwrap()
    }

    #[test]
    fn connection_error_codes() {
        assert_error_codes(
            &[
                ConnectionError::NonExistentReference {
                    operation: "connect".into(),
                    container: "pipeline".into(),
                    missing: id("aa"),
                },
                ConnectionError::CycleDetected {
                    origin: id("aa"),
                    target: id("bb"),
                    path: vec![id("aa"), id("bb"), id("aa")],
                },
            ],
            "CONNECTION_",
        );
    }

    #[test]
    fn composite_error_codes() {
        assert_error_codes(
            &[
                CompositeError::InitializationFailed("x".into()),
                CompositeError::DuplicateComponent(id("aa")),
                CompositeError::InvalidOperation {
                    operation: "activate".into(),
                    state: soma_component::State::Terminated,
                },
            ],
            "COMPOSITE_",
        );
    }

    #[test]
    fn machine_error_codes() {
        assert_error_codes(
            &[
                MachineError::InitializationFailed("x".into()),
                MachineError::DuplicateComposite(id("aa")),
                MachineError::CompositeNotFound(id("aa")),
                MachineError::InvalidOperation {
                    operation: "activate".into(),
                    state: soma_component::State::Terminated,
                },
            ],
            "MACHINE_",
        );
    }

    #[test]
    fn wrapped_errors_delegate_codes() {
        let wrapped = CompositeError::from(ConnectionError::CycleDetected {
            origin: id("aa"),
            target: id("bb"),
            path: vec![],
        });
        assert_error_code(&wrapped, "CONNECTION_");
        assert_eq!(wrapped.code(), "CONNECTION_CYCLE_DETECTED");
    }
}
