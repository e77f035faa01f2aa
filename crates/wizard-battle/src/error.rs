//! Error types for the battle rules.

use wizard_protocol::{ItemKind, Swap};

/// Why a submission was refused by the validator.
///
/// Every variant is a client error. The turn layer reports them all as
/// "bad actions or swaps" and leaves the game untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The battle already has a winner (or is drawn).
    #[error("the battle is already decided")]
    BattleDecided,

    #[error("expected {expected} action(s), got {got}")]
    ActionCount { expected: usize, got: usize },

    #[error("at most {max} swap(s) allowed, got {got}")]
    SwapCount { max: usize, got: usize },

    /// The swap names a roster slot that does not exist.
    #[error("no unit in roster {0}")]
    UnknownSwapSlot(Swap),

    /// The swap names the unit that is already active.
    #[error("unit in {0} is already active")]
    SwapToActive(Swap),

    #[error("unit in {0} has fainted")]
    SwapToFainted(Swap),

    /// The active unit has fainted and no swap replaces it.
    #[error("active unit has fainted and must be swapped out")]
    ActiveFainted,

    #[error("active unit has no move in slot {0}")]
    UnknownMove(usize),

    #[error("move in slot {0} has no pp left")]
    NoPpLeft(usize),

    #[error("no {0:?} left in inventory")]
    ItemNotHeld(ItemKind),
}

/// Why a resolver could not produce the next state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The orders reference something the state does not have. Orders
    /// reaching the resolver are validated first, so this points at a
    /// bug upstream rather than a bad client.
    #[error("orders cannot be applied: {0}")]
    InvalidOrders(String),

    /// The resolver returned a state that breaks a structural invariant.
    #[error("resolver produced an invalid state: {0}")]
    InvalidResult(String),
}
