//! Service configuration.

use serde::{Deserialize, Serialize};
use wizard_battle::RulesConfig;

/// Configuration for a [`TurnService`](crate::TurnService).
///
/// Start from `ServiceConfig::default()` and override the fields you
/// care about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Submission limits for games started through the service.
    pub rules: RulesConfig,

    /// Whether a finished game is detached from its lobby right after the
    /// final result is broadcast. When detached, further submissions get
    /// "no game" and the lobby is free for a rematch.
    ///
    /// Default: `true`.
    pub detach_finished_games: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            rules: RulesConfig::default(),
            detach_finished_games: true,
        }
    }
}
