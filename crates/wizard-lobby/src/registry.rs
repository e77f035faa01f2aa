//! The lobby registry: every open lobby, addressable by ID.
//!
//! # Concurrency note
//!
//! The map is behind a `tokio::sync::RwLock` that is only held for a
//! lookup or an insert. Callers get an `Arc<Lobby>` back and drop the map
//! lock before touching the lobby or its game, so a slow turn in one
//! lobby never blocks lookups for another.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use tokio::sync::RwLock;
use wizard_battle::{BattleState, RulesConfig};
use wizard_protocol::{LobbyId, PlayerId, PlayerToken};
use wizard_turn::{Game, SharedGame};

use crate::{Lobby, LobbyError, LobbyPlayer};

/// Counter for generating unique lobby IDs.
static NEXT_LOBBY_ID: AtomicU64 = AtomicU64::new(1);

/// Tracks all open lobbies.
///
/// ```text
/// create_lobby() ──→ start_game() ──→ (turns…) ──→ end_lobby()
///                        ▲                 │
///                        └── game over ────┘
/// ```
#[derive(Debug, Default)]
pub struct LobbyRegistry {
    lobbies: RwLock<HashMap<LobbyId, Arc<Lobby>>>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a lobby for two matched players and issues their tokens.
    ///
    /// `one` takes position 1 (seat one), `two` position 2.
    pub async fn create_lobby(&self, one: PlayerId, two: PlayerId) -> Arc<Lobby> {
        let id = LobbyId(NEXT_LOBBY_ID.fetch_add(1, Ordering::Relaxed));
        let players = [one, two].map(|id| LobbyPlayer {
            id,
            token: generate_token(),
        });
        let lobby = Arc::new(Lobby::new(id, players));
        self.lobbies.write().await.insert(id, Arc::clone(&lobby));
        tracing::info!(lobby_id = %id, %one, %two, "lobby created");
        lobby
    }

    /// Looks up a lobby.
    pub async fn lobby(&self, id: LobbyId) -> Option<Arc<Lobby>> {
        self.lobbies.read().await.get(&id).cloned()
    }

    /// Like [`lobby`](Self::lobby), but a missing lobby is an error.
    pub async fn get(&self, id: LobbyId) -> Result<Arc<Lobby>, LobbyError> {
        self.lobby(id).await.ok_or(LobbyError::NotFound(id))
    }

    /// Starts a new game in a lobby, seating its players in lobby order.
    ///
    /// # Errors
    /// - [`LobbyError::NotFound`]: no such lobby
    /// - [`LobbyError::GameAlreadyRunning`]: the current game isn't over
    pub async fn start_game(
        &self,
        id: LobbyId,
        battle: BattleState,
        rules: RulesConfig,
    ) -> Result<SharedGame, LobbyError> {
        let lobby = self.get(id).await?;
        let [one, two] = lobby.players();
        let game = Game::new([one.id, two.id], battle, rules);
        let game_id = game.id();
        let game = game.into_shared();
        lobby.set_game(Arc::clone(&game)).await?;
        tracing::info!(lobby_id = %id, %game_id, "game started");
        Ok(game)
    }

    /// Closes a lobby. Any game in it is dropped with it.
    pub async fn end_lobby(&self, id: LobbyId) -> Option<Arc<Lobby>> {
        let lobby = self.lobbies.write().await.remove(&id);
        if lobby.is_some() {
            tracing::info!(lobby_id = %id, "lobby closed");
        }
        lobby
    }

    pub async fn len(&self) -> usize {
        self.lobbies.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lobbies.read().await.is_empty()
    }
}

/// Generates a random 128-bit token, hex-encoded.
fn generate_token() -> PlayerToken {
    let bytes: [u8; 16] = rand::rng().random();
    PlayerToken::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
}

// =========================================================================
// Tests
// =========================================================================
