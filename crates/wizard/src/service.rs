//! `TurnService`: the turn submission entry point.
//!
//! Ties the layers together for one request: protocol → lobby → turn.
//!
//! ```text
//! TurnRequest ─→ lobby lookup ─→ token check ─→ game lookup
//!                                                   │
//!                       seat tokens (positions 1, 2)┘
//!                                                   │
//!                                     TurnSync::submit ─→ TurnAck
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wizard_battle::{BattleState, TurnResolver};
use wizard_lobby::{Lobby, LobbyError, LobbyRegistry};
use wizard_protocol::{Codec, LobbyId, PlayerToken, ProtocolError, TurnRequest};
use wizard_turn::{Broadcaster, SharedGame, Submission, SubmitOutcome, TurnSync};

use crate::{ServiceConfig, WizardError};

/// Reply to an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAck {
    /// The turn the submission was for.
    pub turn: u32,
    /// `true` if this submission completed the turn.
    pub resolved: bool,
    /// `true` if the turn it completed ended the match.
    pub game_over: bool,
}

impl From<SubmitOutcome> for TurnAck {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Waiting { turn } => Self {
                turn,
                resolved: false,
                game_over: false,
            },
            SubmitOutcome::Resolved { turn, game_over } => Self {
                turn,
                resolved: true,
                game_over,
            },
        }
    }
}

/// What goes back over the wire for one submission.
///
/// ```json
/// {"status":"accepted","turn":1,"resolved":false,"game_over":false}
/// {"status":"rejected","code":409,"message":"turn is running"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnReply {
    Accepted(TurnAck),
    Rejected { code: u16, message: String },
}

impl From<&Result<TurnAck, WizardError>> for TurnReply {
    fn from(result: &Result<TurnAck, WizardError>) -> Self {
        match result {
            Ok(ack) => Self::Accepted(*ack),
            Err(e) => Self::Rejected {
                code: e.code(),
                message: e.client_message(),
            },
        }
    }
}

/// Accepts turn submissions for every lobby in a registry.
pub struct TurnService<R, B> {
    registry: Arc<LobbyRegistry>,
    sync: TurnSync<R, B>,
    config: ServiceConfig,
}

impl<R: TurnResolver, B: Broadcaster> TurnService<R, B> {
    pub fn new(
        registry: Arc<LobbyRegistry>,
        resolver: R,
        broadcaster: Arc<B>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            registry,
            sync: TurnSync::new(resolver, broadcaster),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<LobbyRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Starts a game in a lobby using the configured rules.
    pub async fn start_game(
        &self,
        lobby_id: LobbyId,
        battle: BattleState,
    ) -> Result<SharedGame, WizardError> {
        Ok(self
            .registry
            .start_game(lobby_id, battle, self.config.rules)
            .await?)
    }

    /// Handles one turn submission.
    ///
    /// # Errors
    /// Every [`WizardError::is_rejection`] error leaves the game untouched.
    /// See [`WizardError::code`] for the full mapping.
    pub async fn submit(&self, request: TurnRequest) -> Result<TurnAck, WizardError> {
        let TurnRequest {
            lobby_id,
            player_id,
            token,
            turn_actions,
            turn_swap,
        } = request;

        let lobby = self.registry.get(lobby_id).await?;
        lobby.authenticate(player_id, &token)?;
        let game = lobby.game().await.ok_or(LobbyError::NoGame)?;

        // Resolve both recipients before anything is recorded, so a lookup
        // failure can never leave a turn half-processed.
        let recipients = seat_tokens(&lobby)?;

        let submission = Submission {
            player_id,
            actions: turn_actions,
            swaps: turn_swap,
        };
        let outcome = self.sync.submit(&game, submission, &recipients).await?;

        if let SubmitOutcome::Resolved {
            game_over: true, ..
        } = outcome
        {
            tracing::info!(%lobby_id, "game over");
            if self.config.detach_finished_games && lobby.detach_game(&game).await {
                tracing::debug!(%lobby_id, "finished game detached");
            }
        }

        Ok(outcome.into())
    }

    /// Decodes a [`TurnRequest`] with `codec` and submits it.
    pub async fn submit_encoded<C: Codec>(
        &self,
        codec: &C,
        payload: &[u8],
    ) -> Result<TurnAck, WizardError> {
        let request: TurnRequest = codec.decode(payload)?;
        self.submit(request).await
    }

    /// Decodes, submits, and encodes the [`TurnReply`].
    ///
    /// Only fails if the reply itself cannot be encoded.
    pub async fn handle<C: Codec>(
        &self,
        codec: &C,
        payload: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        let result = self.submit_encoded(codec, payload).await;
        if let Err(e) = &result {
            if e.is_rejection() {
                tracing::debug!(code = e.code(), error = %e, "turn request rejected");
            } else {
                tracing::error!(code = e.code(), error = %e, "turn request failed");
            }
        }
        codec.encode(&TurnReply::from(&result))
    }

    /// Reopens a lobby's turn that is stuck resolving.
    ///
    /// Admin hook for a game whose resolving task was cancelled. Both players
    /// are told the turn failed and must submit again.
    pub async fn recover(&self, lobby_id: LobbyId) -> Result<u32, WizardError> {
        let lobby = self.registry.get(lobby_id).await?;
        let game = lobby.game().await.ok_or(LobbyError::NoGame)?;
        let recipients = seat_tokens(&lobby)?;
        Ok(self.sync.recover(&game, &recipients).await?)
    }
}

/// Tokens for lobby positions 1 and 2. A failed lookup here is a server
/// bug, not a client mistake.
fn seat_tokens(lobby: &Lobby) -> Result<[PlayerToken; 2], WizardError> {
    let fetch = |position| {
        lobby
            .player_by_position(position)
            .map(|p| p.token.clone())
            .map_err(|e| {
                tracing::error!(lobby_id = %lobby.id(), position, error = %e, "player position lookup failed");
                WizardError::Internal(e.to_string())
            })
    };
    Ok([fetch(1)?, fetch(2)?])
}
