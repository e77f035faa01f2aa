//! Error types for the lobby layer.

use wizard_protocol::LobbyId;

/// Errors that can occur while looking up or managing lobbies.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// No lobby exists with this ID.
    #[error("invalid lobby id")]
    NotFound(LobbyId),

    /// The token does not belong to the claimed player. Also returned for
    /// players who are not in the lobby at all, so a caller cannot discover
    /// lobby membership.
    #[error("bad token")]
    BadToken,

    /// The lobby has no game in progress.
    #[error("no game")]
    NoGame,

    /// Lobby positions are 1 and 2; anything else is a bug in the caller.
    #[error("no player at lobby position {0}")]
    InvalidPosition(u8),

    /// A game is already being played in this lobby.
    #[error("lobby {0} already has a running game")]
    GameAlreadyRunning(LobbyId),
}
