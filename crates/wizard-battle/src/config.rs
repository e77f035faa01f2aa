//! Per-game rule settings.

use serde::{Deserialize, Serialize};

/// How much a player may submit in a single turn.
///
/// Fixed when a game starts; every submission for that game is validated
/// against the same copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Exact number of actions a submission must carry.
    pub actions_per_turn: usize,

    /// Upper bound on swaps per submission (zero disables swapping).
    pub max_swaps_per_turn: usize,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            actions_per_turn: 1,
            max_swaps_per_turn: 1,
        }
    }
}
