//! Turn resolution: the seam between the turn synchronizer and the rules.
//!
//! The synchronizer only needs [`TurnResolver`]: given the current state
//! and both seats' validated orders, produce the next state and a summary
//! of what happened. [`StandardResolver`] is the reference rules engine.

use std::cmp::Reverse;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wizard_protocol::{Action, ItemKind, Seat, Swap};

use crate::{BattleState, Outcome, ResolveError};

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// One seat's validated submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideOrders {
    pub actions: Vec<Action>,
    pub swaps: Vec<Swap>,
}

/// Everything a resolver gets besides the state itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOrders {
    /// The turn being resolved, starting at 1.
    pub turn: u32,
    pub sides: [SideOrders; 2],
}

impl TurnOrders {
    pub fn side(&self, seat: Seat) -> &SideOrders {
        &self.sides[seat.index()]
    }
}

/// Something observable that happened while resolving a turn, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    Swapped { seat: Seat, from: usize, to: usize },
    Guarded { seat: Seat },
    ItemUsed { seat: Seat, item: ItemKind, restored: u32 },
    Attacked {
        seat: Seat,
        move_slot: usize,
        damage: u32,
        target_hp: u32,
    },
    Fainted { seat: Seat, unit: usize },
    /// The seat's unit could not act (it fainted earlier in the turn, or
    /// its target already had).
    Skipped { seat: Seat },
}

/// The summary of one resolved turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    pub turn: u32,
    pub events: Vec<TurnEvent>,
    /// `Some` if the match ended on this turn.
    pub outcome: Option<Outcome>,
}

impl TurnResult {
    pub fn is_game_over(&self) -> bool {
        self.outcome.is_some()
    }
}

/// The output of [`TurnResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub state: BattleState,
    pub result: TurnResult,
}

// ---------------------------------------------------------------------------
// TurnResolver
// ---------------------------------------------------------------------------

/// Applies both seats' orders to a battle state.
///
/// Implementations must be pure: the same `state` and `orders` always give
/// the same `Resolution`. The synchronizer calls `resolve` at most once per
/// turn, outside the game lock, so implementations may take their time but
/// must not depend on anything besides their inputs.
pub trait TurnResolver: Send + Sync + 'static {
    fn resolve(
        &self,
        state: &BattleState,
        orders: &TurnOrders,
    ) -> Result<Resolution, ResolveError>;
}

impl<R: TurnResolver + ?Sized> TurnResolver for Arc<R> {
    fn resolve(
        &self,
        state: &BattleState,
        orders: &TurnOrders,
    ) -> Result<Resolution, ResolveError> {
        (**self).resolve(state, orders)
    }
}

// ---------------------------------------------------------------------------
// StandardResolver
// ---------------------------------------------------------------------------

const POTION_HEAL: u32 = 20;
const HYPER_POTION_HEAL: u32 = 60;

/// The reference rules engine.
///
/// Turn order:
///
/// 1. Swaps, seat one first.
/// 2. Actions by priority (`Guard`, then `UseItem`, then `Attack`), then by
///    the acting unit's speed, fastest first. Ties go to seat one on odd
///    turns and seat two on even turns.
/// 3. A unit that has fainted by the time it would act does nothing.
///
/// Damage is `power * attack / (2 * defense) + 1`, halved (minimum 1)
/// against a guarding target.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardResolver {
    turn_limit: Option<u32>,
}

impl StandardResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a draw once `limit` turns have been resolved without a
    /// winner.
    pub fn with_turn_limit(limit: u32) -> Self {
        Self {
            turn_limit: Some(limit),
        }
    }
}

impl TurnResolver for StandardResolver {
    fn resolve(
        &self,
        state: &BattleState,
        orders: &TurnOrders,
    ) -> Result<Resolution, ResolveError> {
        let mut next = state.clone();
        let mut events = Vec::new();

        for seat in Seat::BOTH {
            for swap in &orders.side(seat).swaps {
                let side = next.side_mut(seat);
                if swap.0 >= side.roster.len() {
                    return Err(ResolveError::InvalidOrders(format!(
                        "{seat} swap to missing {swap}"
                    )));
                }
                let from = side.active;
                side.active = swap.0;
                events.push(TurnEvent::Swapped {
                    seat,
                    from,
                    to: swap.0,
                });
            }
        }

        let guarding = Seat::BOTH.map(|seat| {
            orders
                .side(seat)
                .actions
                .iter()
                .any(|a| matches!(a, Action::Guard))
        });

        for (seat, action) in action_order(&next, orders) {
            let standing = next
                .side(seat)
                .active_unit()
                .is_some_and(|unit| !unit.is_fainted());
            if !standing {
                events.push(TurnEvent::Skipped { seat });
                continue;
            }

            match action {
                Action::Guard => events.push(TurnEvent::Guarded { seat }),
                Action::UseItem { item } => {
                    let restored = use_item(&mut next, seat, item)?;
                    events.push(TurnEvent::ItemUsed {
                        seat,
                        item,
                        restored,
                    });
                }
                Action::Attack { move_slot } => {
                    attack(
                        &mut next,
                        seat,
                        move_slot,
                        guarding[seat.other().index()],
                        &mut events,
                    )?;
                }
            }
        }

        let outcome = next.outcome().or_else(|| match self.turn_limit {
            Some(limit) if orders.turn >= limit => Some(Outcome::Draw),
            _ => None,
        });

        tracing::trace!(
            turn = orders.turn,
            events = events.len(),
            ?outcome,
            "turn resolved"
        );

        Ok(Resolution {
            state: next,
            result: TurnResult {
                turn: orders.turn,
                events,
                outcome,
            },
        })
    }
}

/// Flattens both seats' actions into execution order.
fn action_order(state: &BattleState, orders: &TurnOrders) -> Vec<(Seat, Action)> {
    let first = if orders.turn % 2 == 1 { Seat::One } else { Seat::Two };

    let mut queue: Vec<(Seat, Action)> = Seat::BOTH
        .iter()
        .flat_map(move |&seat| {
            orders
                .side(seat)
                .actions
                .iter()
                .map(move |&action| (seat, action))
        })
        .collect();

    // `sort_by_key` is stable, so one seat's own actions keep their order.
    queue.sort_by_key(|&(seat, action)| {
        let speed = state.side(seat).active_unit().map_or(0, |u| u.speed);
        (
            Reverse(priority(action)),
            Reverse(speed),
            seat != first,
        )
    });
    queue
}

fn priority(action: Action) -> u8 {
    match action {
        Action::Guard => 2,
        Action::UseItem { .. } => 1,
        Action::Attack { .. } => 0,
    }
}

fn use_item(state: &mut BattleState, seat: Seat, item: ItemKind) -> Result<u32, ResolveError> {
    let side = state.side_mut(seat);
    if !side.inventory.take(item) {
        return Err(ResolveError::InvalidOrders(format!(
            "{seat} has no {item:?} left"
        )));
    }
    let unit = side
        .active_unit_mut()
        .ok_or_else(|| ResolveError::InvalidOrders(format!("{seat} has no active unit")))?;

    let restored = match item {
        ItemKind::Potion | ItemKind::HyperPotion => {
            let heal = if item == ItemKind::Potion {
                POTION_HEAL
            } else {
                HYPER_POTION_HEAL
            };
            let before = unit.hp;
            unit.hp = unit.hp.saturating_add(heal).min(unit.max_hp);
            unit.hp - before
        }
        ItemKind::Ether => unit
            .moves
            .iter_mut()
            .map(|mv| {
                let gained = mv.max_pp - mv.pp.min(mv.max_pp);
                mv.pp = mv.max_pp;
                gained
            })
            .sum(),
    };
    Ok(restored)
}

fn attack(
    state: &mut BattleState,
    seat: Seat,
    move_slot: usize,
    target_guarding: bool,
    events: &mut Vec<TurnEvent>,
) -> Result<(), ResolveError> {
    let attacker = state
        .side_mut(seat)
        .active_unit_mut()
        .ok_or_else(|| ResolveError::InvalidOrders(format!("{seat} has no active unit")))?;
    let attack_stat = attacker.attack;
    let mv = attacker.moves.get_mut(move_slot).ok_or_else(|| {
        ResolveError::InvalidOrders(format!("{seat} has no move in slot {move_slot}"))
    })?;
    if mv.pp == 0 {
        return Err(ResolveError::InvalidOrders(format!(
            "{seat} move in slot {move_slot} has no pp"
        )));
    }
    mv.pp -= 1;
    let power = mv.power;

    let target_seat = seat.other();
    let target_side = state.side_mut(target_seat);
    let target_index = target_side.active;
    let target = match target_side.active_unit_mut() {
        Some(unit) if !unit.is_fainted() => unit,
        _ => {
            events.push(TurnEvent::Skipped { seat });
            return Ok(());
        }
    };

    let mut damage = power.saturating_mul(attack_stat) / target.defense.max(1).saturating_mul(2) + 1;
    if target_guarding {
        damage = (damage / 2).max(1);
    }
    target.hp = target.hp.saturating_sub(damage);
    let target_hp = target.hp;

    events.push(TurnEvent::Attacked {
        seat,
        move_slot,
        damage,
        target_hp,
    });
    if target_hp == 0 {
        events.push(TurnEvent::Fainted {
            seat: target_seat,
            unit: target_index,
        });
    }
    Ok(())
}
