//! Lifecycle state machine.
//!
//! States are partitioned into four categories:
//!
//! | Category | Meaning |
//! |----------|---------|
//! | `Operational` | Current runtime status |
//! | `Lifecycle` | Developmental phase |
//! | `Advanced` | Maturity and specialized behavior |
//! | `Termination` | End of life |
//!
//! Legality is enforced by [`State::validate_transition`] with two rules
//! rather than a full transition table:
//!
//! 1. Termination is absorbing. From a `Termination` state the only legal
//!    moves are forward along the archival chain
//!    `Deactivating → Terminating → Terminated → Archived`; `Archived`
//!    accepts nothing.
//! 2. `Conception` is never re-entered once left. It is the initial state
//!    a component is constructed in, not a transition target.
//!
//! Each state carries a human-readable description, and most carry a
//! biological analog. Both are documentation and logging material only;
//! no code path branches on them.

use serde::{Deserialize, Serialize};

use crate::ComponentError;

/// Category a [`State`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Current runtime status.
    Operational,
    /// Developmental phase.
    Lifecycle,
    /// Maturity and specialized behavior.
    Advanced,
    /// End of life.
    Termination,
}

/// Lifecycle state of a component, composite, or machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    // Operational
    Initializing,
    Ready,
    Active,
    Waiting,
    ReceivingInput,
    ProcessingInput,
    OutputtingResult,
    Error,
    Recovering,
    Paused,
    Dormant,

    // Lifecycle
    Conception,
    Configuring,
    Specializing,
    DevelopingFeatures,
    Adapting,
    Transforming,

    // Advanced
    Stable,
    Spawning,
    Degraded,
    Maintaining,

    // Termination
    Deactivating,
    Terminating,
    Terminated,
    Archived,
}

/// The fixed forward sequence every component walks during construction,
/// starting from [`State::Conception`].
pub const EARLY_LIFECYCLE: [State; 5] = [
    State::Initializing,
    State::Configuring,
    State::Specializing,
    State::DevelopingFeatures,
    State::Ready,
];

impl State {
    /// Returns the category of this state.
    #[must_use]
    pub fn category(self) -> Category {
        match self {
            Self::Initializing
            | Self::Ready
            | Self::Active
            | Self::Waiting
            | Self::ReceivingInput
            | Self::ProcessingInput
            | Self::OutputtingResult
            | Self::Error
            | Self::Recovering
            | Self::Paused
            | Self::Dormant => Category::Operational,
            Self::Conception
            | Self::Configuring
            | Self::Specializing
            | Self::DevelopingFeatures
            | Self::Adapting
            | Self::Transforming => Category::Lifecycle,
            Self::Stable | Self::Spawning | Self::Degraded | Self::Maintaining => {
                Category::Advanced
            }
            Self::Deactivating | Self::Terminating | Self::Terminated | Self::Archived => {
                Category::Termination
            }
        }
    }

    /// Returns a short human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Initializing => "Early structure formation",
            Self::Ready => "Prepared but not active",
            Self::Active => "Fully operational",
            Self::Waiting => "Temporarily inactive but responsive",
            Self::ReceivingInput => "Processing incoming data",
            Self::ProcessingInput => "Performing operations on data",
            Self::OutputtingResult => "Generating output data",
            Self::Error => "Encountered an error during operation",
            Self::Recovering => "Attempting to recover from error",
            Self::Paused => "Temporarily stopped but resumable",
            Self::Dormant => "Inactive but available to reactivate",
            Self::Conception => "Initial creation",
            Self::Configuring => "Establishing boundaries",
            Self::Specializing => "Determining core functions",
            Self::DevelopingFeatures => "Building specific capabilities",
            Self::Adapting => "Adjusting to environmental changes",
            Self::Transforming => "Undergoing major changes",
            Self::Stable => "Optimal performance",
            Self::Spawning => "Creating child components",
            Self::Degraded => "Experiencing performance issues",
            Self::Maintaining => "Undergoing repair operations",
            Self::Deactivating => "Preparing to shut down",
            Self::Terminating => "Shutting down",
            Self::Terminated => "Completed shutdown",
            Self::Archived => "Knowledge preserved after termination",
        }
    }

    /// Returns the biological analog for this state, if one exists.
    ///
    /// Documentation and logging only; never branched on.
    #[must_use]
    pub fn biological_analog(self) -> Option<&'static str> {
        match self {
            Self::Conception => Some("Fertilization/Zygote"),
            Self::Initializing => Some("Cleavage"),
            Self::Configuring => Some("Blastulation"),
            Self::Specializing => Some("Gastrulation"),
            Self::DevelopingFeatures => Some("Organogenesis"),
            Self::Adapting => Some("Environmental Adaptation"),
            Self::Transforming => Some("Metamorphosis"),
            Self::Stable => Some("Maturity"),
            Self::Spawning => Some("Reproduction"),
            Self::Degraded => Some("Senescence"),
            Self::Maintaining => Some("Healing"),
            Self::Terminating => Some("Death"),
            Self::Terminated => Some("Deceased"),
            Self::Archived => Some("Legacy"),
            _ => None,
        }
    }

    /// Returns true if this is an operational state.
    #[must_use]
    pub fn is_operational(self) -> bool {
        self.category() == Category::Operational
    }

    /// Returns true if this is a lifecycle-phase state.
    #[must_use]
    pub fn is_lifecycle(self) -> bool {
        self.category() == Category::Lifecycle
    }

    /// Returns true if this is an advanced state.
    #[must_use]
    pub fn is_advanced(self) -> bool {
        self.category() == Category::Advanced
    }

    /// Returns true if this is a termination state.
    #[must_use]
    pub fn is_termination(self) -> bool {
        self.category() == Category::Termination
    }

    /// Checks whether moving from `current` to `proposed` is legal.
    ///
    /// Identity moves (`current == proposed`) are handled as no-ops by
    /// callers and never reach this function.
    pub fn validate_transition(current: State, proposed: State) -> Result<(), ComponentError> {
        let invalid = || ComponentError::InvalidTransition {
            from: current,
            to: proposed,
        };

        if current.is_termination() {
            // Only forward movement along the archival chain is allowed.
            match (current.termination_rank(), proposed.termination_rank()) {
                (Some(from), Some(to)) if to > from => return Ok(()),
                _ => return Err(invalid()),
            }
        }

        if proposed == Self::Conception {
            return Err(invalid());
        }

        Ok(())
    }

    /// Position in the archival chain, for termination states only.
    fn termination_rank(self) -> Option<u8> {
        match self {
            Self::Deactivating => Some(0),
            Self::Terminating => Some(1),
            Self::Terminated => Some(2),
            Self::Archived => Some(3),
            _ => None,
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} ({})", self.description())?;
        if let Some(analog) = self.biological_analog() {
            write!(f, " [{analog}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(State::Active.category(), Category::Operational);
        assert_eq!(State::Conception.category(), Category::Lifecycle);
        assert_eq!(State::Degraded.category(), Category::Advanced);
        assert_eq!(State::Archived.category(), Category::Termination);
    }

    #[test]
    fn free_movement_outside_termination() {
        State::validate_transition(State::Ready, State::Active).unwrap();
        State::validate_transition(State::Active, State::Error).unwrap();
        State::validate_transition(State::Error, State::Recovering).unwrap();
        State::validate_transition(State::Recovering, State::Active).unwrap();
        State::validate_transition(State::Stable, State::Deactivating).unwrap();
    }

    #[test]
    fn termination_is_absorbing() {
        for target in [State::Ready, State::Active, State::Error, State::Conception] {
            let err = State::validate_transition(State::Terminated, target).unwrap_err();
            assert!(matches!(
                err,
                ComponentError::InvalidTransition {
                    from: State::Terminated,
                    ..
                }
            ));
        }
    }

    #[test]
    fn archival_chain_moves_forward_only() {
        State::validate_transition(State::Deactivating, State::Terminating).unwrap();
        State::validate_transition(State::Terminating, State::Terminated).unwrap();
        State::validate_transition(State::Terminated, State::Archived).unwrap();
        // Skipping ahead is still forward.
        State::validate_transition(State::Deactivating, State::Terminated).unwrap();

        State::validate_transition(State::Terminating, State::Deactivating).unwrap_err();
        State::validate_transition(State::Archived, State::Terminated).unwrap_err();
        State::validate_transition(State::Archived, State::Archived).unwrap_err();
    }

    #[test]
    fn conception_is_never_reentered() {
        State::validate_transition(State::Ready, State::Conception).unwrap_err();
        State::validate_transition(State::Initializing, State::Conception).unwrap_err();
    }

    #[test]
    fn lifecycle_states_have_analogs() {
        for state in [
            State::Conception,
            State::Configuring,
            State::Specializing,
            State::DevelopingFeatures,
        ] {
            assert!(state.biological_analog().is_some(), "{state:?}");
        }
        assert_eq!(State::Ready.biological_analog(), None);
    }

    #[test]
    fn display_includes_description() {
        let text = State::Conception.to_string();
        assert!(text.contains("Initial creation"));
        assert!(text.contains("Fertilization/Zygote"));

        let plain = State::Ready.to_string();
        assert!(plain.contains("Prepared but not active"));
        assert!(!plain.contains('['));
    }
}
