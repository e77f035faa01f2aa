//! A lobby: two matched players and the game they are playing.

use std::sync::Arc;

use tokio::sync::RwLock;
use wizard_protocol::{LobbyId, PlayerId, PlayerToken, Seat};
use wizard_turn::{SharedGame, TurnPhase};

use crate::LobbyError;

/// A player seated in a lobby, with the secret token they authenticate with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyPlayer {
    pub id: PlayerId,
    pub token: PlayerToken,
}

/// Two matched players plus at most one active game.
///
/// Players and tokens are fixed for the lobby's lifetime. Only the game
/// slot changes, so it is the only thing behind a lock. The lock guards the
/// slot, not the game: game state has its own mutex inside [`SharedGame`].
#[derive(Debug)]
pub struct Lobby {
    id: LobbyId,
    players: [LobbyPlayer; 2],
    game: RwLock<Option<SharedGame>>,
}

impl Lobby {
    /// Creates a lobby with no game. `players[0]` is position 1.
    pub fn new(id: LobbyId, players: [LobbyPlayer; 2]) -> Self {
        Self {
            id,
            players,
            game: RwLock::new(None),
        }
    }

    pub fn id(&self) -> LobbyId {
        self.id
    }

    pub fn players(&self) -> &[LobbyPlayer; 2] {
        &self.players
    }

    /// The token issued to `player_id`, or `None` if they aren't here.
    pub fn player_token(&self, player_id: PlayerId) -> Option<&PlayerToken> {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .map(|p| &p.token)
    }

    /// The player at lobby position 1 or 2.
    ///
    /// # Errors
    /// [`LobbyError::InvalidPosition`] for any other position.
    pub fn player_by_position(&self, position: u8) -> Result<&LobbyPlayer, LobbyError> {
        Seat::from_position(position)
            .map(|seat| &self.players[seat.index()])
            .ok_or(LobbyError::InvalidPosition(position))
    }

    /// Checks that `token` was issued to `player_id` and returns their seat.
    ///
    /// The token comparison does not exit early on the first differing
    /// byte; see [`PlayerToken::matches`].
    pub fn authenticate(
        &self,
        player_id: PlayerId,
        token: &PlayerToken,
    ) -> Result<Seat, LobbyError> {
        Seat::BOTH
            .into_iter()
            .find(|seat| {
                let p = &self.players[seat.index()];
                p.id == player_id && p.token.matches(token)
            })
            .ok_or(LobbyError::BadToken)
    }

    /// The current game, if one is attached.
    pub async fn game(&self) -> Option<SharedGame> {
        self.game.read().await.clone()
    }

    /// Attaches a game. A finished game still attached is replaced.
    ///
    /// # Errors
    /// [`LobbyError::GameAlreadyRunning`] if the attached game hasn't
    /// reached `GameOver`.
    pub async fn set_game(&self, game: SharedGame) -> Result<(), LobbyError> {
        let mut slot = self.game.write().await;
        if let Some(current) = slot.as_ref() {
            if current.lock().await.phase() != TurnPhase::GameOver {
                return Err(LobbyError::GameAlreadyRunning(self.id));
            }
        }
        *slot = Some(game);
        Ok(())
    }

    /// Detaches and returns the current game.
    pub async fn clear_game(&self) -> Option<SharedGame> {
        self.game.write().await.take()
    }

    /// Detaches `game` if it is still the one attached. Returns `false` if
    /// another game has replaced it in the meantime.
    pub async fn detach_game(&self, game: &SharedGame) -> bool {
        let mut slot = self.game.write().await;
        match slot.as_ref() {
            Some(current) if Arc::ptr_eq(current, game) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }
}
