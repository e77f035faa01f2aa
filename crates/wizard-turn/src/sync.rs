//! The turn synchronizer: accepts submissions and resolves each turn
//! exactly once.
//!
//! # Protocol
//!
//! ```text
//!  submit ──lock──→ phase/ready checks → validate → record
//!                       │
//!                       ├─ one player ready ──→ GameInfo ──unlock──→ Waiting
//!                       │
//!                       └─ both ready ──→ GameInfo → Resolving (ticket)
//!                                              │
//!                                           unlock
//!                                              │
//!                                          resolver (no lock held)
//!                                              │
//!                                            lock ──→ Resolved → reset → TurnResolved
//! ```
//!
//! Only the task that moves a game from `Collecting` to `Resolving` holds a
//! ticket, and only a ticket can complete a turn. A second submission that
//! arrives while the resolver runs sees `Resolving` and is refused, so the
//! resolver runs at most once per turn no matter how submissions race.
//!
//! # Why the lock is dropped around the resolver
//!
//! The resolver is arbitrary code and may be slow. Holding the game lock
//! across it would leave the other player's request queued on the lock
//! for the whole resolution instead of being refused straight away with
//! `TurnAlreadyRunning`. The `Resolving` phase does the job the lock would
//! have done: nothing else can record, begin or reset while it is set.
//!
//! Dropping the lock means the world can change before step 3 re-acquires
//! it. A manual [`TurnSync::recover`] may reopen the turn, and the players
//! may even resubmit and start a second attempt at the same turn number.
//! Step 3 therefore never trusts the turn number alone: the ticket's epoch
//! must still be the game's epoch, otherwise the result is discarded as
//! stale and the newer attempt is left alone.

use std::sync::Arc;

use tokio::runtime::Handle;
use wizard_battle::{validate, Resolution, ResolveError, TurnResolver};
use wizard_protocol::{Action, PlayerId, PlayerToken, Swap};

use crate::{Broadcaster, Game, GameEvent, ResolutionTicket, SharedGame, TurnError, TurnPhase};

/// One player's orders for the current turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub player_id: PlayerId,
    pub actions: Vec<Action>,
    pub swaps: Vec<Swap>,
}

/// What an accepted submission led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Accepted; the other player has not submitted yet.
    Waiting { turn: u32 },
    /// Accepted, and this submission completed the turn.
    Resolved { turn: u32, game_over: bool },
}

impl SubmitOutcome {
    pub fn turn(&self) -> u32 {
        match self {
            Self::Waiting { turn } | Self::Resolved { turn, .. } => *turn,
        }
    }
}

/// Drives submissions and resolution for any number of games.
///
/// Holds no per-game state of its own; everything lives in the
/// [`SharedGame`] passed to each call, so one `TurnSync` serves every
/// lobby.
pub struct TurnSync<R, B> {
    resolver: R,
    broadcaster: Arc<B>,
}

impl<R: TurnResolver, B: Broadcaster> TurnSync<R, B> {
    pub fn new(resolver: R, broadcaster: Arc<B>) -> Self {
        Self {
            resolver,
            broadcaster,
        }
    }

    pub fn broadcaster(&self) -> &Arc<B> {
        &self.broadcaster
    }

    /// Submits one player's orders for the current turn.
    ///
    /// `recipients` are the tokens of both players, in seat order; every
    /// event this call produces goes to them.
    ///
    /// Rejections leave the game exactly as it was. If this submission
    /// makes both players ready, the turn is resolved before returning.
    ///
    /// # Errors
    /// - [`TurnError::TurnAlreadyRunning`] / [`TurnError::GameOver`]
    /// - [`TurnError::NotInGame`] / [`TurnError::AlreadyReady`]
    /// - [`TurnError::IllegalActionOrSwap`] with the validator's reason
    /// - [`TurnError::ResolutionFault`]: the turn was reopened
    pub async fn submit(
        &self,
        game: &SharedGame,
        submission: Submission,
        recipients: &[PlayerToken],
    ) -> Result<SubmitOutcome, TurnError> {
        let Submission {
            player_id,
            actions,
            swaps,
        } = submission;

        // --- Step 1: accept under the lock ---
        let ticket = {
            let mut game = game.lock().await;
            if let Err(e) = Self::accept(&mut game, player_id, actions, swaps) {
                tracing::debug!(game_id = %game.id(), %player_id, error = %e, "submission rejected");
                return Err(e);
            }

            let game_id = game.id();
            let turn = game.turn();
            tracing::debug!(%game_id, %player_id, turn, "submission accepted");
            self.broadcaster.send(
                recipients,
                &GameEvent::GameInfo {
                    game_id,
                    turn,
                    ready: game.readiness(),
                },
            );

            if !game.is_ready() {
                return Ok(SubmitOutcome::Waiting { turn });
            }
            game.begin_resolution()?
        };

        // --- Step 2: resolve without the lock ---
        let turn = ticket.turn();
        let guard = ResolutionGuard::new(game, &ticket, recipients, &self.broadcaster);
        let resolved = self
            .resolver
            .resolve(&ticket.state, &ticket.orders)
            .and_then(|resolution| check_resolution(&ticket, resolution));

        // --- Step 3: install the result under the lock ---
        let mut game = game.lock().await;
        guard.disarm();

        let resolution = match resolved {
            Ok(resolution) => resolution,
            Err(source) => {
                game.abort_resolution(Some(ticket.epoch))?;
                tracing::warn!(game_id = %ticket.game_id, turn, error = %source, "turn resolution failed, turn reopened");
                self.broadcaster.send(
                    recipients,
                    &GameEvent::TurnFailed {
                        game_id: ticket.game_id,
                        turn,
                        reason: source.to_string(),
                    },
                );
                return Err(TurnError::ResolutionFault { turn, source });
            }
        };

        game.complete_resolution(&ticket, resolution)?;
        let phase = game.advance()?;
        let game_over = phase == TurnPhase::GameOver;

        let Some(result) = game.last_result().cloned() else {
            return Err(TurnError::InvalidPhase {
                op: "broadcast a missing result",
                phase,
            });
        };
        tracing::info!(game_id = %ticket.game_id, turn, game_over, "turn resolved");
        self.broadcaster.send(
            recipients,
            &GameEvent::TurnResolved {
                game_id: ticket.game_id,
                result,
                state: game.battle().clone(),
                next_turn: game.turn(),
                ready: game.readiness(),
                game_over,
            },
        );

        Ok(SubmitOutcome::Resolved { turn, game_over })
    }

    /// Reopens a game stuck in `Resolving` for its current turn.
    ///
    /// Both players are notified with `TurnFailed` and must submit again.
    /// Returns the reopened turn.
    pub async fn recover(
        &self,
        game: &SharedGame,
        recipients: &[PlayerToken],
    ) -> Result<u32, TurnError> {
        let mut game = game.lock().await;
        let turn = game.abort_resolution(None)?;
        tracing::warn!(game_id = %game.id(), turn, "stuck turn reopened");
        self.broadcaster.send(
            recipients,
            &GameEvent::TurnFailed {
                game_id: game.id(),
                turn,
                reason: "turn was reset".into(),
            },
        );
        Ok(turn)
    }

    /// Checks and records one submission. Nothing is mutated unless every
    /// check passes.
    fn accept(
        game: &mut Game,
        player_id: PlayerId,
        actions: Vec<Action>,
        swaps: Vec<Swap>,
    ) -> Result<(), TurnError> {
        game.ensure_accepting()?;
        let seat = game
            .seat_of(player_id)
            .ok_or(TurnError::NotInGame(player_id, game.id()))?;
        if game.is_player_ready(player_id) {
            return Err(TurnError::AlreadyReady(player_id));
        }
        validate(game.battle(), seat, &actions, &swaps, game.rules())?;
        game.set_player_ready(player_id, actions, swaps)
    }
}

/// Rejects resolver output that does not belong to this turn or breaks a
/// state invariant.
fn check_resolution(
    ticket: &ResolutionTicket,
    resolution: Resolution,
) -> Result<Resolution, ResolveError> {
    if resolution.result.turn != ticket.turn() {
        return Err(ResolveError::InvalidResult(format!(
            "result is for turn {}, expected {}",
            resolution.result.turn,
            ticket.turn()
        )));
    }
    resolution
        .state
        .integrity_check()
        .map_err(ResolveError::InvalidResult)?;
    Ok(resolution)
}

// ---------------------------------------------------------------------------
// ResolutionGuard
// ---------------------------------------------------------------------------

/// Drop guard that reopens the turn if resolution never finishes.
///
/// Armed while the resolver runs outside the lock. If the resolver panics
/// or the submitting future is dropped before the result is installed, the
/// game would otherwise stay in `Resolving` forever, and both players would
/// be refused with `TurnAlreadyRunning` until someone called `recover`.
///
/// `Drop` is synchronous and cannot wait for the async game lock, so the
/// abort runs in a spawned task. By the time that task gets the lock the
/// game may have moved on (recovered, resubmitted, resolved again); the
/// abort carries the ticket's epoch and is a no-op unless that exact
/// attempt is still running.
///
/// Disarm it only while holding the lock in step 3, so there is no window
/// in which neither the guard nor the submitting task owns the cleanup.
struct ResolutionGuard<B: Broadcaster> {
    game: SharedGame,
    turn: u32,
    epoch: u64,
    recipients: Vec<PlayerToken>,
    broadcaster: Arc<B>,
    armed: bool,
}

impl<B: Broadcaster> ResolutionGuard<B> {
    fn new(
        game: &SharedGame,
        ticket: &ResolutionTicket,
        recipients: &[PlayerToken],
        broadcaster: &Arc<B>,
    ) -> Self {
        Self {
            game: Arc::clone(game),
            turn: ticket.turn(),
            epoch: ticket.epoch,
            recipients: recipients.to_vec(),
            broadcaster: Arc::clone(broadcaster),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<B: Broadcaster> Drop for ResolutionGuard<B> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(handle) = Handle::try_current() else {
            tracing::error!(turn = self.turn, "resolution interrupted outside a runtime, game left resolving");
            return;
        };

        let game = Arc::clone(&self.game);
        let turn = self.turn;
        let epoch = self.epoch;
        let recipients = std::mem::take(&mut self.recipients);
        let broadcaster = Arc::clone(&self.broadcaster);
        handle.spawn(async move {
            let mut game = game.lock().await;
            if game.abort_resolution(Some(epoch)).is_ok() {
                tracing::warn!(game_id = %game.id(), turn, "resolution interrupted, turn reopened");
                broadcaster.send(
                    &recipients,
                    &GameEvent::TurnFailed {
                        game_id: game.id(),
                        turn,
                        reason: "resolution was interrupted".into(),
                    },
                );
            }
        });
    }
}
