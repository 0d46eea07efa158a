//! Per-run context and panel lifecycle states.

use serde::{Deserialize, Serialize};

/// Context threaded through one pipeline run.
///
/// `sequence` only disambiguates artifact names between runs: a higher value
/// means a later run. It carries no other ordering guarantee.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct RunContext {
    /// Run sequence counter
    sequence: u64,
}

impl RunContext {
    /// Creates a context for the given sequence.
    pub fn new(sequence: u64) -> Self {
        Self { sequence }
    }
}

/// Lifecycle of a single panel.
///
/// `Pending → Synthesizing → Persisted → Ordered` on success,
/// `Pending → Synthesizing → Failed` otherwise. A chained panel whose
/// ancestor failed goes straight from `Pending` to `Failed`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIs,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PanelState {
    /// Waiting for dispatch (or for its ancestor)
    Pending,
    /// Synthesizer call in flight
    Synthesizing,
    /// Image saved by the artifact store
    Persisted,
    /// Display ordinal derived; terminal
    Ordered,
    /// Synthesis or persistence failed; terminal
    Failed,
}

impl PanelState {
    /// Whether no further transitions can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PanelState::Ordered | PanelState::Failed)
    }

    /// Whether the transition `self → next` is part of the lifecycle.
    pub fn can_transition_to(&self, next: PanelState) -> bool {
        use PanelState::*;
        matches!(
            (self, next),
            (Pending, Synthesizing)
                | (Pending, Failed)
                | (Synthesizing, Persisted)
                | (Synthesizing, Failed)
                | (Persisted, Ordered)
                | (Persisted, Failed)
        )
    }
}

/// A single observed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PanelTransition {
    /// Panel display name
    panel: String,
    /// Previous state
    from: PanelState,
    /// New state
    to: PanelState,
}

impl PanelTransition {
    /// Creates a transition record.
    pub fn new(panel: impl Into<String>, from: PanelState, to: PanelState) -> Self {
        Self {
            panel: panel.into(),
            from,
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        assert!(PanelState::Pending.can_transition_to(PanelState::Synthesizing));
        assert!(PanelState::Synthesizing.can_transition_to(PanelState::Persisted));
        assert!(PanelState::Persisted.can_transition_to(PanelState::Ordered));
        assert!(!PanelState::Pending.can_transition_to(PanelState::Persisted));
        assert!(!PanelState::Ordered.can_transition_to(PanelState::Failed));
        assert!(PanelState::Failed.is_terminal());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PanelState::Synthesizing.to_string(), "synthesizing");
    }
}
