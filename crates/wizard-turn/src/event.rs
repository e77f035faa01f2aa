//! Events pushed to the players of a game.

use serde::{Deserialize, Serialize};
use wizard_battle::{BattleState, TurnResult};
use wizard_protocol::GameId;

/// A server-to-player notification about a game.
///
/// Serialized with a `"type"` tag so clients can dispatch on it:
///
/// ```json
/// {"type":"game_info","game_id":3,"turn":2,"ready":[true,false]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Sent after every accepted submission. `ready` is in seat order.
    GameInfo {
        game_id: GameId,
        turn: u32,
        ready: [bool; 2],
    },

    /// Sent once per resolved turn, after the tracker has been reset.
    ///
    /// `ready` is therefore always `[false, false]` here; together with
    /// the `GameInfo` that preceded it, players observe both flags go
    /// up and then come back down.
    TurnResolved {
        game_id: GameId,
        result: TurnResult,
        state: BattleState,
        next_turn: u32,
        ready: [bool; 2],
        game_over: bool,
    },

    /// The turn could not be resolved and was reopened. Both players must
    /// submit again for the same turn.
    TurnFailed {
        game_id: GameId,
        turn: u32,
        reason: String,
    },
}

impl GameEvent {
    pub fn game_id(&self) -> GameId {
        match self {
            Self::GameInfo { game_id, .. }
            | Self::TurnResolved { game_id, .. }
            | Self::TurnFailed { game_id, .. } => *game_id,
        }
    }
}
