//! Event layer errors.
//!
//! # Error Code Convention
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`HandlerFailed`](EventError::HandlerFailed) | `EVENT_HANDLER_FAILED` | Yes |

use soma_types::ErrorCode;
use thiserror::Error;

/// Event layer error.
///
/// `HandlerFailed` is the value a handler returns to signal failure; the
/// dispatcher logs it and carries on; it never escapes `dispatch`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// A handler reported a failure while processing an event.
    #[error("event handler failed: {0}")]
    HandlerFailed(String),
}

impl ErrorCode for EventError {
    fn code(&self) -> &'static str {
        match self {
            Self::HandlerFailed(_) => "EVENT_HANDLER_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}
