//! Component layer errors.
//!
//! All errors implement [`ErrorCode`] for unified handling.
//!
//! # Error Code Convention
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`InitializationFailed`](ComponentError::InitializationFailed) | `COMPONENT_INITIALIZATION_FAILED` | No |
//! | [`InvalidTransition`](ComponentError::InvalidTransition) | `COMPONENT_INVALID_TRANSITION` | Yes |
//! | [`Terminated`](ComponentError::Terminated) | `COMPONENT_TERMINATED` | No |
//! | [`InvalidTerminationDelay`](ComponentError::InvalidTerminationDelay) | `COMPONENT_INVALID_TERMINATION_DELAY` | Yes |
//!
//! `InvalidTransition` is recoverable in the sense that the caller can pick
//! a legal target instead; `Terminated` is not, because nothing brings a
//! terminated component back.

use soma_types::ErrorCode;
use thiserror::Error;

use crate::State;

/// Component layer error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// The early lifecycle sequence could not complete. The component was
    /// never exposed to the caller.
    #[error("component initialization failed: {0}")]
    InitializationFailed(String),

    /// The attempted transition violates the state machine invariants.
    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: State, to: State },

    /// Operation attempted on a terminated component.
    #[error("component is terminated: cannot {operation}")]
    Terminated { operation: String },

    /// Scheduled termination delay must be greater than zero.
    #[error("termination delay must be greater than zero")]
    InvalidTerminationDelay,
}

impl ErrorCode for ComponentError {
    fn code(&self) -> &'static str {
        match self {
            Self::InitializationFailed(_) => "COMPONENT_INITIALIZATION_FAILED",
            Self::InvalidTransition { .. } => "COMPONENT_INVALID_TRANSITION",
            Self::Terminated { .. } => "COMPONENT_TERMINATED",
            Self::InvalidTerminationDelay => "COMPONENT_INVALID_TERMINATION_DELAY",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. } | Self::InvalidTerminationDelay
        )
    }
}
