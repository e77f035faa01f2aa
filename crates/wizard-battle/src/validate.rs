//! The action validator.
//!
//! [`validate`] answers one question: may this seat submit these actions
//! and swaps against this state? It is a pure function of its arguments,
//! so the turn layer can call it under the game lock, tests can call it
//! in a loop, and a client can run the very same check to grey out
//! illegal buttons before submitting.

use std::collections::HashMap;

use wizard_protocol::{Action, ItemKind, Seat, Swap};

use crate::{BattleState, Rejection, RulesConfig, Side};

/// Checks a submission without mutating anything.
///
/// Checks run in a fixed order so the same bad submission always gets the
/// same rejection:
///
/// 1. the battle is still undecided
/// 2. action and swap counts match `rules`
/// 3. every swap names a bench unit that is standing
/// 4. the unit that will be active after the swaps is standing
/// 5. every action is possible for that unit and inventory
///
/// With more than one action per turn, step 5 counts what the actions
/// consume together: two potions need two held, two uses of a move need
/// two PP. Restores from an ether used in the same turn are not counted.
pub fn validate(
    state: &BattleState,
    seat: Seat,
    actions: &[Action],
    swaps: &[Swap],
    rules: &RulesConfig,
) -> Result<(), Rejection> {
    if state.outcome().is_some() {
        return Err(Rejection::BattleDecided);
    }

    if actions.len() != rules.actions_per_turn {
        return Err(Rejection::ActionCount {
            expected: rules.actions_per_turn,
            got: actions.len(),
        });
    }
    if swaps.len() > rules.max_swaps_per_turn {
        return Err(Rejection::SwapCount {
            max: rules.max_swaps_per_turn,
            got: swaps.len(),
        });
    }

    let side = state.side(seat);
    let mut acting = side.active;
    for &swap in swaps {
        check_swap(side, acting, swap)?;
        acting = swap.0;
    }

    let unit = side
        .roster
        .get(acting)
        .ok_or(Rejection::UnknownSwapSlot(Swap(acting)))?;
    if unit.is_fainted() {
        return Err(Rejection::ActiveFainted);
    }

    let mut pp_spent = vec![0u32; unit.moves.len()];
    let mut items_used: HashMap<ItemKind, u32> = HashMap::new();
    for action in actions {
        match *action {
            Action::Attack { move_slot } => {
                let mv = unit
                    .moves
                    .get(move_slot)
                    .ok_or(Rejection::UnknownMove(move_slot))?;
                let spent = &mut pp_spent[move_slot];
                if mv.pp <= *spent {
                    return Err(Rejection::NoPpLeft(move_slot));
                }
                *spent += 1;
            }
            Action::UseItem { item } => {
                let used = items_used.entry(item).or_default();
                if side.inventory.count(item) <= *used {
                    return Err(Rejection::ItemNotHeld(item));
                }
                *used += 1;
            }
            Action::Guard => {}
        }
    }

    Ok(())
}

fn check_swap(side: &Side, active: usize, swap: Swap) -> Result<(), Rejection> {
    let unit = side
        .roster
        .get(swap.0)
        .ok_or(Rejection::UnknownSwapSlot(swap))?;
    if swap.0 == active {
        return Err(Rejection::SwapToActive(swap));
    }
    if unit.is_fainted() {
        return Err(Rejection::SwapToFainted(swap));
    }
    Ok(())
}
