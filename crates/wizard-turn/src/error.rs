//! Error types for the turn layer.

use wizard_battle::{Rejection, ResolveError};
use wizard_protocol::{GameId, PlayerId};

use crate::TurnPhase;

/// Errors that can occur while submitting to or resolving a turn.
///
/// Everything above `ResolutionFault` is a rejection: the submission was
/// refused and the game is exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// Both players are ready and the turn is being resolved.
    #[error("turn is running")]
    TurnAlreadyRunning,

    /// The player already submitted for this turn.
    #[error("player {0} is already ready")]
    AlreadyReady(PlayerId),

    /// The validator refused the submission.
    #[error("bad actions or swaps: {0}")]
    IllegalActionOrSwap(#[from] Rejection),

    /// The player does not hold a seat in this game.
    #[error("player {0} is not in game {1}")]
    NotInGame(PlayerId, GameId),

    /// The match has ended.
    #[error("game {0} is over")]
    GameOver(GameId),

    /// An internal transition was attempted from the wrong phase.
    #[error("cannot {op} while {phase}")]
    InvalidPhase { op: &'static str, phase: TurnPhase },

    /// The resolver failed. The turn was rolled back to Collecting and
    /// both players must submit again.
    #[error("turn {turn} could not be resolved: {source}")]
    ResolutionFault {
        turn: u32,
        #[source]
        source: ResolveError,
    },

    /// A resolution finished for a turn the game is no longer resolving
    /// (it was aborted in the meantime). The result was discarded.
    #[error("resolution for turn {turn} is stale")]
    StaleResolution { turn: u32 },
}
