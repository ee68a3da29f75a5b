//! Interlock operating state.
//!
//! `Startup` → `Armed` only through a successful confirmation. Any trip moves
//! to `Tripped` from every state. There is no terminal state.

use core::fmt;

/// Operating state of the interlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SafetyState {
    /// Initial state: switches off, indicator on.
    #[default]
    Startup,
    /// Switches on, indicator off.
    Armed,
    /// Switches off, indicator on.
    Tripped,
}

impl fmt::Display for SafetyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => write!(f, "Startup"),
            Self::Armed => write!(f, "Armed"),
            Self::Tripped => write!(f, "Tripped"),
        }
    }
}

/// Event fed to the state machine after its output side effects ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyEvent {
    /// A shutdown relay tripped.
    Trip,
    /// A warning relay tripped.
    Warning,
    /// Every active relay read safe on confirmation.
    ConfirmSucceeded,
    /// At least one active relay read unsafe or could not be read.
    ConfirmFailed,
}

/// Result of feeding an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// State changed.
    Changed { from: SafetyState, to: SafetyState },
    /// Event accepted, state kept.
    Unchanged(SafetyState),
}

impl TransitionResult {
    /// State after the event.
    pub const fn state(self) -> SafetyState {
        match self {
            Self::Changed { to, .. } => to,
            Self::Unchanged(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SafetyStateMachine {
    state: SafetyState,
}

impl SafetyStateMachine {
    /// Create a new state machine in `Startup`.
    pub const fn new() -> Self {
        Self {
            state: SafetyState::Startup,
        }
    }

    #[inline]
    pub const fn state(&self) -> SafetyState {
        self.state
    }

    /// Every event is valid in every state.
    pub fn handle_event(&mut self, event: SafetyEvent) -> TransitionResult {
        use SafetyEvent::*;
        use SafetyState::*;

        let next = match event {
            Trip => Tripped,
            ConfirmSucceeded => Armed,
            Warning | ConfirmFailed => self.state,
        };

        if next == self.state {
            TransitionResult::Unchanged(next)
        } else {
            let from = self.state;
            self.state = next;
            TransitionResult::Changed { from, to: next }
        }
    }
}
