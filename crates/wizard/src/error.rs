//! Unified error type for the wizard duel server.

use wizard_lobby::LobbyError;
use wizard_protocol::ProtocolError;
use wizard_turn::TurnError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// The request could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Lobby lookup or authentication failed.
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// The turn layer refused the submission or could not resolve it.
    #[error(transparent)]
    Turn(#[from] TurnError),

    /// Something that should never happen did. Details are logged; clients
    /// only ever see "server error".
    #[error("server error: {0}")]
    Internal(String),
}

impl WizardError {
    /// HTTP-style status code for this error.
    ///
    /// | code | meaning |
    /// |------|---------|
    /// | 400  | malformed request or illegal actions |
    /// | 401  | bad token |
    /// | 404  | unknown lobby, or no game in it |
    /// | 409  | turn is running, already ready, game over, game already started |
    /// | 500  | internal error or resolution fault |
    pub fn code(&self) -> u16 {
        match self {
            Self::Protocol(_) => 400,
            Self::Lobby(e) => match e {
                LobbyError::NotFound(_) | LobbyError::NoGame => 404,
                LobbyError::BadToken => 401,
                LobbyError::GameAlreadyRunning(_) => 409,
                LobbyError::InvalidPosition(_) => 500,
            },
            Self::Turn(e) => match e {
                TurnError::IllegalActionOrSwap(_) => 400,
                TurnError::TurnAlreadyRunning
                | TurnError::AlreadyReady(_)
                | TurnError::GameOver(_) => 409,
                TurnError::NotInGame(..)
                | TurnError::InvalidPhase { .. }
                | TurnError::ResolutionFault { .. }
                | TurnError::StaleResolution { .. } => 500,
            },
            Self::Internal(_) => 500,
        }
    }

    /// Returns `true` if the client caused this error. Rejections never
    /// change game state.
    pub fn is_rejection(&self) -> bool {
        (400..500).contains(&self.code())
    }

    /// The message shown to the client.
    ///
    /// Rejections explain themselves; everything else is "server error" so
    /// internals never leak to players.
    pub fn client_message(&self) -> String {
        if self.is_rejection() {
            match self {
                Self::Protocol(_) => "request is invalid".to_string(),
                other => other.to_string(),
            }
        } else {
            "server error".to_string()
        }
    }
}
