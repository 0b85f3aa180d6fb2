//! Thread-safe holder of a single current [`State`].

use std::sync::{PoisonError, RwLock};

use crate::{ComponentError, State};

/// Owns the current state of one component or container.
///
/// Validation and the swap happen under one write lock, so two racing
/// transitions serialize and the loser is validated against the winner's
/// result.
#[derive(Debug)]
pub struct Lifecycle {
    state: RwLock<State>,
}

impl Lifecycle {
    /// Creates a lifecycle holding `initial`.
    #[must_use]
    pub fn new(initial: State) -> Self {
        Self {
            state: RwLock::new(initial),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn current(&self) -> State {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves to `next`, returning the previous state.
    ///
    /// A transition to the current state is a no-op and always succeeds;
    /// callers detect it by comparing the returned state with `next`.
    pub fn transition(&self, next: State) -> Result<State, ComponentError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let current = *state;
        if current == next {
            return Ok(current);
        }
        State::validate_transition(current, next)?;
        *state = next;
        Ok(current)
    }

    /// Returns true if the current state is in the termination category.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.current().is_termination()
    }
}
