//! The per-game turn state machine.

use serde::{Deserialize, Serialize};

/// Where a game is within its current turn.
///
/// ```text
///            ┌──────────── abort ────────────┐
///            ▼                               │
/// Collecting ──(both ready)──→ Resolving ──(resolved)──→ Resolved
///     ▲                                                    │
///     └──────────────(next turn)───────────────────────────┤
///                                                          ▼
///                                               GameOver (terminal)
/// ```
///
/// - **Collecting**: accepts one submission per player.
/// - **Resolving**: both players are ready and exactly one task is running
///   the resolver. Submissions are refused with "turn is running".
/// - **Resolved**: the new state is in place; held only while the result
///   is broadcast, then the game moves on.
/// - **GameOver**: the match ended. Nothing is accepted any more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    Collecting,
    Resolving,
    Resolved,
    GameOver,
}

impl TurnPhase {
    /// Returns `true` if submissions are accepted in this phase.
    pub fn is_accepting(&self) -> bool {
        matches!(self, Self::Collecting)
    }

    /// Returns `true` if the transition to `target` is allowed.
    ///
    /// `Resolving → Collecting` is the abort path taken when a resolution
    /// fails or is interrupted.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Collecting, Self::Resolving)
                | (Self::Resolving, Self::Resolved)
                | (Self::Resolving, Self::Collecting)
                | (Self::Resolved, Self::Collecting)
                | (Self::Resolved, Self::GameOver)
        )
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collecting => write!(f, "Collecting"),
            Self::Resolving => write!(f, "Resolving"),
            Self::Resolved => write!(f, "Resolved"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_phase_happy_path_transitions() {
        assert!(TurnPhase::Collecting.can_transition_to(TurnPhase::Resolving));
        assert!(TurnPhase::Resolving.can_transition_to(TurnPhase::Resolved));
        assert!(TurnPhase::Resolved.can_transition_to(TurnPhase::Collecting));
        assert!(TurnPhase::Resolved.can_transition_to(TurnPhase::GameOver));
    }

    #[test]
    fn test_turn_phase_rejects_skips_and_reversals() {
        assert!(!TurnPhase::Collecting.can_transition_to(TurnPhase::Resolved));
        assert!(!TurnPhase::Resolved.can_transition_to(TurnPhase::Resolving));
        assert!(!TurnPhase::Collecting.can_transition_to(TurnPhase::GameOver));
        assert!(!TurnPhase::GameOver.can_transition_to(TurnPhase::Collecting));
    }

    #[test]
    fn test_turn_phase_resolving_can_abort_to_collecting() {
        assert!(TurnPhase::Resolving.can_transition_to(TurnPhase::Collecting));
    }

    #[test]
    fn test_turn_phase_only_collecting_accepts() {
        assert!(TurnPhase::Collecting.is_accepting());
        assert!(!TurnPhase::Resolving.is_accepting());
        assert!(!TurnPhase::Resolved.is_accepting());
        assert!(!TurnPhase::GameOver.is_accepting());
    }

    #[test]
    fn test_turn_phase_display() {
        assert_eq!(TurnPhase::Resolving.to_string(), "Resolving");
        assert_eq!(TurnPhase::GameOver.to_string(), "GameOver");
    }
}
