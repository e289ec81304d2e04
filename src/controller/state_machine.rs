//! Finite state machine for a single reconciliation attempt loop
//!
//! Each attempt moves `ReadConfig -> Decide -> {NoOp | Mutate} -> Submit` and ends in
//! `Done`, `Retry` (back to `ReadConfig`) or `Fatal`. The engine drives the machine
//! with events and refuses transitions that are not in the table, so every step is
//! checked and traced.

use std::fmt;

/// Phases of a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcilePhase {
    /// Fetching the live configuration
    ReadConfig,
    /// Comparing live against desired
    Decide,
    /// Nothing to change
    NoOp,
    /// Edit applied to the in-memory configuration
    Mutate,
    /// Replacement configuration sent to the cluster
    Submit,
    /// Waiting to re-read after a transient rejection
    Retry,
    /// Finished successfully (terminal)
    Done,
    /// Finished with an error (terminal)
    Fatal,
}

impl ReconcilePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReconcilePhase::Done | ReconcilePhase::Fatal)
    }
}

impl fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Events that trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileEvent {
    /// The live configuration was read
    ConfigRead,
    /// Live state already matches desired state
    AlreadyConverged,
    /// Live state differs from desired state
    ChangeRequired,
    /// The edit was applied in memory
    Mutated,
    /// The cluster accepted the replacement configuration
    Accepted,
    /// The connection dropped mid-submission; the outcome is unknown
    ConnectionReset,
    /// The cluster rejected the submission with a transient code
    TransientRejection,
    /// The retry budget still allows another attempt
    RetryScheduled,
    /// A non-retryable failure occurred
    FatalError,
    /// The no-op result was reported
    Reported,
}

impl fmt::Display for ReconcileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A state transition definition
#[derive(Debug)]
pub struct Transition {
    pub from: ReconcilePhase,
    pub to: ReconcilePhase,
    pub event: ReconcileEvent,
    pub description: &'static str,
}

impl Transition {
    const fn new(
        from: ReconcilePhase,
        to: ReconcilePhase,
        event: ReconcileEvent,
        description: &'static str,
    ) -> Self {
        Self {
            from,
            to,
            event,
            description,
        }
    }
}

/// Result of attempting a state transition
#[derive(Debug, PartialEq)]
pub enum TransitionResult {
    Success {
        from: ReconcilePhase,
        to: ReconcilePhase,
        event: ReconcileEvent,
        description: &'static str,
    },
    InvalidTransition {
        current: ReconcilePhase,
        event: ReconcileEvent,
    },
}

/// Transition table for the reconciliation loop
pub struct ReconcileStateMachine {
    transitions: Vec<Transition>,
}

impl Default for ReconcileStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcileStateMachine {
    pub fn new() -> Self {
        use ReconcileEvent as E;
        use ReconcilePhase as P;

        Self {
            transitions: vec![
                // === ReadConfig ===
                Transition::new(
                    P::ReadConfig,
                    P::Decide,
                    E::ConfigRead,
                    "Live configuration read",
                ),
                Transition::new(
                    P::ReadConfig,
                    P::Fatal,
                    E::FatalError,
                    "Configuration could not be read",
                ),
                // === Decide ===
                Transition::new(
                    P::Decide,
                    P::NoOp,
                    E::AlreadyConverged,
                    "Desired state already holds",
                ),
                Transition::new(
                    P::Decide,
                    P::Mutate,
                    E::ChangeRequired,
                    "Configuration edit required",
                ),
                // === NoOp ===
                Transition::new(
                    P::NoOp,
                    P::Done,
                    E::Reported,
                    "Reported unchanged",
                ),
                // === Mutate ===
                Transition::new(
                    P::Mutate,
                    P::Submit,
                    E::Mutated,
                    "Submitting replacement configuration",
                ),
                Transition::new(
                    P::Mutate,
                    P::Fatal,
                    E::FatalError,
                    "Edit would break a configuration invariant",
                ),
                // === Submit ===
                Transition::new(
                    P::Submit,
                    P::Done,
                    E::Accepted,
                    "Cluster accepted the configuration",
                ),
                Transition::new(
                    P::Submit,
                    P::Done,
                    E::ConnectionReset,
                    "Primary changed mid-submission, outcome unconfirmed",
                ),
                Transition::new(
                    P::Submit,
                    P::Retry,
                    E::TransientRejection,
                    "Transient rejection, will re-read",
                ),
                Transition::new(
                    P::Submit,
                    P::Fatal,
                    E::FatalError,
                    "Cluster rejected the configuration",
                ),
                // === Retry ===
                Transition::new(
                    P::Retry,
                    P::ReadConfig,
                    E::RetryScheduled,
                    "Retrying with a fresh configuration",
                ),
                Transition::new(
                    P::Retry,
                    P::Fatal,
                    E::FatalError,
                    "Retry budget exhausted",
                ),
                // Done and Fatal are terminal
            ],
        }
    }

    /// Attempt to transition from `current` on `event`
    pub fn transition(&self, current: ReconcilePhase, event: ReconcileEvent) -> TransitionResult {
        match self
            .transitions
            .iter()
            .find(|t| t.from == current && t.event == event)
        {
            Some(t) => TransitionResult::Success {
                from: t.from,
                to: t.to,
                event,
                description: t.description,
            },
            None => TransitionResult::InvalidTransition { current, event },
        }
    }

    /// Check if a transition exists
    pub fn can_transition(&self, from: ReconcilePhase, event: ReconcileEvent) -> bool {
        self.transitions
            .iter()
            .any(|t| t.from == from && t.event == event)
    }

    /// All events accepted in `state`
    pub fn valid_events(&self, state: ReconcilePhase) -> Vec<ReconcileEvent> {
        self.transitions
            .iter()
            .filter(|t| t.from == state)
            .map(|t| t.event)
            .collect()
    }
}

/// Cursor over the state machine that records the path taken
#[derive(Debug)]
pub struct PhaseTracker<'a> {
    machine: &'a ReconcileStateMachine,
    current: ReconcilePhase,
    history: Vec<ReconcilePhase>,
}

impl<'a> PhaseTracker<'a> {
    pub fn new(machine: &'a ReconcileStateMachine) -> Self {
        Self {
            machine,
            current: ReconcilePhase::ReadConfig,
            history: vec![ReconcilePhase::ReadConfig],
        }
    }

    pub fn current(&self) -> ReconcilePhase {
        self.current
    }

    /// Phases visited so far, starting with `ReadConfig`
    pub fn history(&self) -> &[ReconcilePhase] {
        &self.history
    }

    /// Apply `event`; an event not valid in the current phase leaves it unchanged
    pub fn fire(&mut self, event: ReconcileEvent) -> TransitionResult {
        let result = self.machine.transition(self.current, event);
        match &result {
            TransitionResult::Success {
                from,
                to,
                description,
                ..
            } => {
                tracing::debug!(%from, %to, %event, "{}", description);
                self.current = *to;
                self.history.push(*to);
            }
            TransitionResult::InvalidTransition { current, event } => {
                tracing::warn!(%current, %event, "Ignoring invalid reconcile transition");
            }
        }
        result
    }
}

impl fmt::Debug for ReconcileStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconcileStateMachine")
            .field("transitions", &self.transitions.len())
            .finish()
    }
}
