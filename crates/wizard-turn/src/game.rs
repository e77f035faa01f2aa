//! The game: one match's readiness tracker and turn phase.
//!
//! A `Game` is plain data guarded by one `tokio::sync::Mutex` per
//! instance ([`SharedGame`]). Two games never share a lock, so matches
//! in different lobbies never wait on each other. Every read-modify-write
//! (check readiness, then mark ready) must happen under a single lock
//! acquisition; [`crate::TurnSync`] is the only caller that does so.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use wizard_battle::{
    BattleState, Resolution, RulesConfig, SideOrders, TurnOrders, TurnResult,
};
use wizard_protocol::{Action, GameId, PlayerId, Seat, Swap};

use crate::{TurnError, TurnPhase};

/// Counter for generating unique game IDs.
static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// A game behind its own exclusive guard.
pub type SharedGame = Arc<Mutex<Game>>;

/// One player's seat in a game and what they submitted this turn.
#[derive(Debug, Clone)]
pub struct PlayerSlot {
    pub player_id: PlayerId,
    pub ready: bool,
    pub actions: Vec<Action>,
    pub swaps: Vec<Swap>,
}

impl PlayerSlot {
    fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            ready: false,
            actions: Vec::new(),
            swaps: Vec::new(),
        }
    }

    fn clear(&mut self) {
        self.ready = false;
        self.actions.clear();
        self.swaps.clear();
    }
}

/// Proof that the holder moved a game into `Resolving` for one turn.
///
/// Issued by [`Game::begin_resolution`] under the game lock. It carries a
/// snapshot of everything the resolver needs, which lets the resolver run
/// after the lock is released.
///
/// A ticket is bound to one resolution *attempt*, not just to a turn
/// number. If an attempt is aborted (a resolver fault, an interrupted
/// resolution or a manual [`recover`](crate::TurnSync::recover)) the same
/// turn is collected and resolved again, and two tickets for that turn
/// number can be in flight at once. The `epoch` tells them apart: only the
/// ticket whose epoch matches the game's current one may complete or abort
/// the turn, so a late result computed from discarded orders is dropped.
#[derive(Debug, Clone)]
pub struct ResolutionTicket {
    pub game_id: GameId,
    pub epoch: u64,
    pub state: BattleState,
    pub orders: TurnOrders,
}

impl ResolutionTicket {
    pub fn turn(&self) -> u32 {
        self.orders.turn
    }
}

/// One ongoing match between two seated players.
#[derive(Debug)]
pub struct Game {
    id: GameId,
    turn: u32,
    phase: TurnPhase,
    battle: BattleState,
    rules: RulesConfig,
    slots: [PlayerSlot; 2],
    last_result: Option<TurnResult>,
    /// Bumped whenever a resolution attempt starts or is aborted.
    epoch: u64,
}

impl Game {
    /// Starts a new game at turn 1 with a fresh ID.
    ///
    /// `players[0]` takes seat one, `players[1]` seat two.
    pub fn new(players: [PlayerId; 2], battle: BattleState, rules: RulesConfig) -> Self {
        let id = GameId(NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            turn: 1,
            phase: TurnPhase::Collecting,
            battle,
            rules,
            slots: players.map(PlayerSlot::new),
            last_result: None,
            epoch: 0,
        }
    }

    /// Wraps the game in its exclusive guard.
    pub fn into_shared(self) -> SharedGame {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    /// The turn currently being collected or resolved.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn battle(&self) -> &BattleState {
        &self.battle
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// The most recently resolved turn, if any.
    pub fn last_result(&self) -> Option<&TurnResult> {
        self.last_result.as_ref()
    }

    /// The current resolution epoch. See [`ResolutionTicket`].
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn slot(&self, seat: Seat) -> &PlayerSlot {
        &self.slots[seat.index()]
    }

    /// The seat held by `player_id`, if they play in this game.
    pub fn seat_of(&self, player_id: PlayerId) -> Option<Seat> {
        Seat::BOTH
            .into_iter()
            .find(|seat| self.slots[seat.index()].player_id == player_id)
    }

    // -- Readiness tracker ------------------------------------------------

    /// Returns `true` if `player_id` has submitted this turn. Unknown
    /// players are never ready.
    pub fn is_player_ready(&self, player_id: PlayerId) -> bool {
        self.seat_of(player_id)
            .is_some_and(|seat| self.slots[seat.index()].ready)
    }

    /// Both players' ready flags, in seat order.
    pub fn readiness(&self) -> [bool; 2] {
        [self.slots[0].ready, self.slots[1].ready]
    }

    /// Returns `true` once both players have submitted.
    pub fn is_ready(&self) -> bool {
        self.slots.iter().all(|slot| slot.ready)
    }

    /// Fails with the rejection a submission in the current phase gets.
    pub fn ensure_accepting(&self) -> Result<(), TurnError> {
        match self.phase {
            TurnPhase::Collecting => Ok(()),
            TurnPhase::GameOver => Err(TurnError::GameOver(self.id)),
            TurnPhase::Resolving | TurnPhase::Resolved => {
                Err(TurnError::TurnAlreadyRunning)
            }
        }
    }

    /// Records a submission and marks the player ready.
    ///
    /// Does not validate the actions; callers run the validator first.
    ///
    /// # Errors
    /// - [`TurnError::TurnAlreadyRunning`] / [`TurnError::GameOver`]:
    ///   not collecting
    /// - [`TurnError::NotInGame`]: the player has no seat here
    /// - [`TurnError::AlreadyReady`]: second submission this turn
    pub fn set_player_ready(
        &mut self,
        player_id: PlayerId,
        actions: Vec<Action>,
        swaps: Vec<Swap>,
    ) -> Result<(), TurnError> {
        self.ensure_accepting()?;
        let seat = self
            .seat_of(player_id)
            .ok_or(TurnError::NotInGame(player_id, self.id))?;
        let slot = &mut self.slots[seat.index()];
        if slot.ready {
            return Err(TurnError::AlreadyReady(player_id));
        }
        slot.ready = true;
        slot.actions = actions;
        slot.swaps = swaps;
        Ok(())
    }

    /// Clears both submissions and moves on to the next turn.
    ///
    /// # Errors
    /// [`TurnError::InvalidPhase`] unless the current turn is `Resolved`.
    pub fn reset_for_next_turn(&mut self) -> Result<(), TurnError> {
        self.transition("reset for the next turn", TurnPhase::Resolved, TurnPhase::Collecting)?;
        for slot in &mut self.slots {
            slot.clear();
        }
        self.turn += 1;
        Ok(())
    }

    // -- Resolution -------------------------------------------------------

    /// Moves `Collecting → Resolving` and snapshots the resolver input.
    ///
    /// Only succeeds when both players are ready; whoever holds the lock
    /// at that moment gets the one ticket for this attempt. Starts a new
    /// epoch, so tickets from earlier attempts go stale.
    pub fn begin_resolution(&mut self) -> Result<ResolutionTicket, TurnError> {
        if !self.is_ready() {
            return Err(TurnError::InvalidPhase {
                op: "resolve before both players are ready",
                phase: self.phase,
            });
        }
        self.transition("begin resolution", TurnPhase::Collecting, TurnPhase::Resolving)?;
        self.epoch += 1;

        let sides = self.slots.each_ref().map(|slot| SideOrders {
            actions: slot.actions.clone(),
            swaps: slot.swaps.clone(),
        });
        Ok(ResolutionTicket {
            game_id: self.id,
            epoch: self.epoch,
            state: self.battle.clone(),
            orders: TurnOrders {
                turn: self.turn,
                sides,
            },
        })
    }

    /// Installs the resolver's output and moves `Resolving → Resolved`.
    ///
    /// # Errors
    /// [`TurnError::StaleResolution`] if the ticket's attempt is no longer
    /// the one being resolved. The game is left untouched in that case.
    pub fn complete_resolution(
        &mut self,
        ticket: &ResolutionTicket,
        resolution: Resolution,
    ) -> Result<(), TurnError> {
        self.check_ticket(ticket)?;
        self.transition("complete resolution", TurnPhase::Resolving, TurnPhase::Resolved)?;
        self.battle = resolution.state;
        self.last_result = Some(resolution.result);
        Ok(())
    }

    /// Leaves `Resolved` for the next turn, or for `GameOver` if the last
    /// result ended the match. Returns the phase entered.
    pub fn advance(&mut self) -> Result<TurnPhase, TurnError> {
        let finished = self
            .last_result
            .as_ref()
            .is_some_and(TurnResult::is_game_over);
        if finished {
            self.transition("finish the game", TurnPhase::Resolved, TurnPhase::GameOver)?;
            for slot in &mut self.slots {
                slot.clear();
            }
        } else {
            self.reset_for_next_turn()?;
        }
        Ok(self.phase)
    }

    /// Rolls a turn stuck in `Resolving` back to `Collecting`.
    ///
    /// Both submissions are dropped and the turn number stays the same, so
    /// both players submit again. With `Some(epoch)`, only aborts if that
    /// attempt is still the one being resolved. `None` aborts whatever is
    /// running; that is what a manual reset uses.
    ///
    /// Returns the reopened turn.
    pub fn abort_resolution(&mut self, epoch: Option<u64>) -> Result<u32, TurnError> {
        if epoch.is_some_and(|epoch| epoch != self.epoch) {
            return Err(TurnError::StaleResolution { turn: self.turn });
        }
        self.transition("abort resolution", TurnPhase::Resolving, TurnPhase::Collecting)?;
        self.epoch += 1;
        for slot in &mut self.slots {
            slot.clear();
        }
        Ok(self.turn)
    }

    fn check_ticket(&self, ticket: &ResolutionTicket) -> Result<(), TurnError> {
        if ticket.game_id != self.id
            || ticket.epoch != self.epoch
            || ticket.turn() != self.turn
            || self.phase != TurnPhase::Resolving
        {
            return Err(TurnError::StaleResolution {
                turn: ticket.turn(),
            });
        }
        Ok(())
    }

    /// Moves from `from`, which must be the current phase, to `to`.
    fn transition(
        &mut self,
        op: &'static str,
        from: TurnPhase,
        to: TurnPhase,
    ) -> Result<(), TurnError> {
        if self.phase != from || !from.can_transition_to(to) {
            return Err(TurnError::InvalidPhase {
                op,
                phase: self.phase,
            });
        }
        tracing::trace!(game_id = %self.id, turn = self.turn, %from, %to, "phase change");
        self.phase = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the readiness tracker and the phase bookkeeping.
    //! The locking protocol around them is covered in `tests/turn_sync.rs`.

    use super::*;
    use wizard_battle::{Inventory, Outcome, Side, Unit};

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn battle() -> BattleState {
        let unit = || Unit::new("squire", 20, 5, 5, 5).with_move("poke", 10, 10);
        BattleState::new(
            Side::new(vec![unit(), unit()], Inventory::default()),
            Side::new(vec![unit()], Inventory::default()),
        )
    }

    fn game() -> Game {
        Game::new([pid(1), pid(2)], battle(), RulesConfig::default())
    }

    fn resolution(ticket: &ResolutionTicket, outcome: Option<Outcome>) -> Resolution {
        Resolution {
            state: ticket.state.clone(),
            result: TurnResult {
                turn: ticket.turn(),
                events: vec![],
                outcome,
            },
        }
    }

    fn ready_both(game: &mut Game) {
        game.set_player_ready(pid(1), vec![Action::Guard], vec![]).unwrap();
        game.set_player_ready(pid(2), vec![Action::Guard], vec![Swap(0)]).unwrap();
    }

    // =====================================================================
    // Readiness
    // =====================================================================

    #[test]
    fn test_new_game_starts_collecting_turn_one_nobody_ready() {
        let game = game();
        assert_eq!(game.turn(), 1);
        assert_eq!(game.phase(), TurnPhase::Collecting);
        assert_eq!(game.readiness(), [false, false]);
        assert!(!game.is_ready());
    }

    #[test]
    fn test_new_games_get_distinct_ids() {
        assert_ne!(game().id(), game().id());
    }

    #[test]
    fn test_set_player_ready_marks_only_that_player() {
        let mut game = game();
        game.set_player_ready(pid(1), vec![Action::Guard], vec![]).unwrap();

        assert!(game.is_player_ready(pid(1)));
        assert!(!game.is_player_ready(pid(2)));
        assert!(!game.is_ready());
        assert_eq!(game.slot(Seat::One).actions, vec![Action::Guard]);
    }

    #[test]
    fn test_set_player_ready_twice_returns_already_ready_state_unchanged() {
        let mut game = game();
        game.set_player_ready(pid(1), vec![Action::Guard], vec![]).unwrap();

        let result = game.set_player_ready(
            pid(1),
            vec![Action::Attack { move_slot: 0 }],
            vec![Swap(1)],
        );

        assert!(matches!(result, Err(TurnError::AlreadyReady(p)) if p == pid(1)));
        assert_eq!(game.slot(Seat::One).actions, vec![Action::Guard]);
        assert!(game.slot(Seat::One).swaps.is_empty());
    }

    #[test]
    fn test_set_player_ready_unknown_player_returns_not_in_game() {
        let mut game = game();
        let result = game.set_player_ready(pid(9), vec![Action::Guard], vec![]);
        assert!(matches!(result, Err(TurnError::NotInGame(p, _)) if p == pid(9)));
        assert!(!game.is_player_ready(pid(9)));
    }

    #[test]
    fn test_is_ready_when_both_submitted() {
        let mut game = game();
        ready_both(&mut game);
        assert!(game.is_ready());
        assert_eq!(game.readiness(), [true, true]);
    }

    // =====================================================================
    // Phase transitions
    // =====================================================================

    #[test]
    fn test_begin_resolution_requires_both_ready() {
        let mut game = game();
        game.set_player_ready(pid(1), vec![Action::Guard], vec![]).unwrap();
        assert!(matches!(
            game.begin_resolution(),
            Err(TurnError::InvalidPhase { .. })
        ));
        assert_eq!(game.phase(), TurnPhase::Collecting);
    }

    #[test]
    fn test_begin_resolution_snapshots_orders_in_seat_order() {
        let mut game = game();
        ready_both(&mut game);

        let ticket = game.begin_resolution().unwrap();

        assert_eq!(game.phase(), TurnPhase::Resolving);
        assert_eq!(ticket.turn(), 1);
        assert_eq!(ticket.orders.side(Seat::One).actions, vec![Action::Guard]);
        assert_eq!(ticket.orders.side(Seat::Two).swaps, vec![Swap(0)]);
    }

    #[test]
    fn test_begin_resolution_twice_only_first_succeeds() {
        let mut game = game();
        ready_both(&mut game);

        assert!(game.begin_resolution().is_ok());
        assert!(matches!(
            game.begin_resolution(),
            Err(TurnError::InvalidPhase { phase: TurnPhase::Resolving, .. })
        ));
    }

    #[test]
    fn test_submission_while_resolving_returns_turn_already_running() {
        let mut game = game();
        ready_both(&mut game);
        game.begin_resolution().unwrap();

        let result = game.set_player_ready(pid(1), vec![Action::Guard], vec![]);
        assert!(matches!(result, Err(TurnError::TurnAlreadyRunning)));
    }

    #[test]
    fn test_reset_for_next_turn_outside_resolved_returns_invalid_phase() {
        let mut game = game();
        assert!(matches!(
            game.reset_for_next_turn(),
            Err(TurnError::InvalidPhase { phase: TurnPhase::Collecting, .. })
        ));
        assert_eq!(game.turn(), 1);
    }

    #[test]
    fn test_reset_after_resolved_clears_everything_and_advances_turn() {
        let mut game = game();
        ready_both(&mut game);
        let ticket = game.begin_resolution().unwrap();
        game.complete_resolution(&ticket, resolution(&ticket, None)).unwrap();
        assert_eq!(game.phase(), TurnPhase::Resolved);

        game.reset_for_next_turn().unwrap();

        assert_eq!(game.phase(), TurnPhase::Collecting);
        assert_eq!(game.turn(), 2);
        for seat in Seat::BOTH {
            let slot = game.slot(seat);
            assert!(!slot.ready);
            assert!(slot.actions.is_empty());
            assert!(slot.swaps.is_empty());
        }
        assert_eq!(game.last_result().map(|r| r.turn), Some(1));
    }

    #[test]
    fn test_advance_with_outcome_enters_game_over() {
        let mut game = game();
        ready_both(&mut game);
        let ticket = game.begin_resolution().unwrap();
        let finished = resolution(&ticket, Some(Outcome::Winner(Seat::Two)));
        game.complete_resolution(&ticket, finished).unwrap();

        assert_eq!(game.advance().unwrap(), TurnPhase::GameOver);
        assert!(matches!(
            game.set_player_ready(pid(1), vec![Action::Guard], vec![]),
            Err(TurnError::GameOver(_))
        ));
        assert_eq!(game.turn(), 1);
    }

    #[test]
    fn test_abort_resolution_returns_to_collecting_same_turn() {
        let mut game = game();
        ready_both(&mut game);
        let ticket = game.begin_resolution().unwrap();

        assert_eq!(game.abort_resolution(Some(ticket.epoch)).unwrap(), 1);
        assert_eq!(game.phase(), TurnPhase::Collecting);
        assert_eq!(game.readiness(), [false, false]);

        // The old ticket can no longer complete the turn.
        let late = game.complete_resolution(&ticket, resolution(&ticket, None));
        assert!(matches!(late, Err(TurnError::StaleResolution { turn: 1 })));
        assert_eq!(game.phase(), TurnPhase::Collecting);
    }

    #[test]
    fn test_abort_resolution_while_collecting_is_refused() {
        let mut game = game();
        assert!(game.abort_resolution(None).is_err());
        assert!(matches!(
            game.abort_resolution(Some(game.epoch())),
            Err(TurnError::InvalidPhase { phase: TurnPhase::Collecting, .. })
        ));
    }

    #[test]
    fn test_old_ticket_after_abort_and_restart_is_stale() {
        let mut game = game();
        ready_both(&mut game);
        let old = game.begin_resolution().unwrap();
        game.abort_resolution(None).unwrap();

        ready_both(&mut game);
        let fresh = game.begin_resolution().unwrap();
        assert_eq!(old.turn(), fresh.turn());
        assert_ne!(old.epoch, fresh.epoch);

        // The old attempt can neither abort nor complete the new one.
        assert!(matches!(
            game.abort_resolution(Some(old.epoch)),
            Err(TurnError::StaleResolution { turn: 1 })
        ));
        assert!(matches!(
            game.complete_resolution(&old, resolution(&old, None)),
            Err(TurnError::StaleResolution { turn: 1 })
        ));
        assert_eq!(game.phase(), TurnPhase::Resolving);

        game.complete_resolution(&fresh, resolution(&fresh, None)).unwrap();
        assert_eq!(game.phase(), TurnPhase::Resolved);
    }
}
