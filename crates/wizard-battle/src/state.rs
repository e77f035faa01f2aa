//! Battle state: rosters, units, inventories, and both sides of a duel.

use serde::{Deserialize, Serialize};
use wizard_protocol::{ItemKind, Seat};

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// One move a unit knows, with its remaining uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub name: String,
    pub power: u32,
    pub pp: u32,
    pub max_pp: u32,
}

/// A single fighter on a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub moves: Vec<MoveSlot>,
}

impl Unit {
    /// Creates a unit at full health with no moves.
    pub fn new(
        name: impl Into<String>,
        max_hp: u32,
        attack: u32,
        defense: u32,
        speed: u32,
    ) -> Self {
        Self {
            name: name.into(),
            hp: max_hp,
            max_hp,
            attack,
            defense,
            speed,
            moves: Vec::new(),
        }
    }

    /// Teaches the unit a move with full PP.
    pub fn with_move(mut self, name: impl Into<String>, power: u32, pp: u32) -> Self {
        self.moves.push(MoveSlot {
            name: name.into(),
            power,
            pp,
            max_pp: pp,
        });
        self
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Items a player still holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub potions: u32,
    pub hyper_potions: u32,
    pub ethers: u32,
}

impl Inventory {
    /// How many of `item` are left.
    pub fn count(&self, item: ItemKind) -> u32 {
        match item {
            ItemKind::Potion => self.potions,
            ItemKind::HyperPotion => self.hyper_potions,
            ItemKind::Ether => self.ethers,
        }
    }

    /// Removes one `item`. Returns `false` (and changes nothing) if none
    /// are left.
    pub fn take(&mut self, item: ItemKind) -> bool {
        let slot = match item {
            ItemKind::Potion => &mut self.potions,
            ItemKind::HyperPotion => &mut self.hyper_potions,
            ItemKind::Ether => &mut self.ethers,
        };
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// One player's half of the battle: the roster, which unit is active,
/// and the items they carry. Every roster entry other than `active` is
/// on the bench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Side {
    pub roster: Vec<Unit>,
    pub active: usize,
    pub inventory: Inventory,
}

impl Side {
    /// Creates a side with the first roster entry active.
    pub fn new(roster: Vec<Unit>, inventory: Inventory) -> Self {
        Self {
            roster,
            active: 0,
            inventory,
        }
    }

    /// The active unit, if the active index is in range.
    pub fn active_unit(&self) -> Option<&Unit> {
        self.roster.get(self.active)
    }

    pub fn active_unit_mut(&mut self) -> Option<&mut Unit> {
        self.roster.get_mut(self.active)
    }

    /// `true` once every unit on the roster has fainted.
    pub fn is_defeated(&self) -> bool {
        self.roster.iter().all(Unit::is_fainted)
    }
}

// ---------------------------------------------------------------------------
// BattleState
// ---------------------------------------------------------------------------

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "seat")]
pub enum Outcome {
    Winner(Seat),
    Draw,
}

/// The full, serializable state of one duel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    pub sides: [Side; 2],
}

impl BattleState {
    pub fn new(one: Side, two: Side) -> Self {
        Self { sides: [one, two] }
    }

    pub fn side(&self, seat: Seat) -> &Side {
        &self.sides[seat.index()]
    }

    pub fn side_mut(&mut self, seat: Seat) -> &mut Side {
        &mut self.sides[seat.index()]
    }

    /// The outcome implied by the rosters alone: a side with no standing
    /// unit loses, and if both fall on the same turn it is a draw.
    pub fn outcome(&self) -> Option<Outcome> {
        match (self.sides[0].is_defeated(), self.sides[1].is_defeated()) {
            (true, true) => Some(Outcome::Draw),
            (true, false) => Some(Outcome::Winner(Seat::Two)),
            (false, true) => Some(Outcome::Winner(Seat::One)),
            (false, false) => None,
        }
    }

    /// Checks the structural invariants a resolver must preserve.
    ///
    /// Returns a description of the first violation found.
    pub fn integrity_check(&self) -> Result<(), String> {
        for seat in Seat::BOTH {
            let side = self.side(seat);
            if side.roster.is_empty() {
                return Err(format!("{seat} has an empty roster"));
            }
            if side.active >= side.roster.len() {
                return Err(format!(
                    "{seat} active index {} out of range (roster of {})",
                    side.active,
                    side.roster.len()
                ));
            }
            for (i, unit) in side.roster.iter().enumerate() {
                if unit.hp > unit.max_hp {
                    return Err(format!(
                        "{seat} unit {i} has {} hp over max {}",
                        unit.hp, unit.max_hp
                    ));
                }
                if let Some(mv) = unit.moves.iter().find(|m| m.pp > m.max_pp) {
                    return Err(format!(
                        "{seat} unit {i} move {} has pp over max",
                        mv.name
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side_of(units: Vec<Unit>) -> Side {
        Side::new(units, Inventory::default())
    }

    #[test]
    fn test_inventory_take_decrements_until_empty() {
        let mut inv = Inventory {
            potions: 1,
            ..Inventory::default()
        };
        assert!(inv.take(ItemKind::Potion));
        assert_eq!(inv.count(ItemKind::Potion), 0);
        assert!(!inv.take(ItemKind::Potion));
        assert!(!inv.take(ItemKind::Ether));
    }

    #[test]
    fn test_outcome_none_while_both_sides_stand() {
        let state = BattleState::new(
            side_of(vec![Unit::new("a", 10, 1, 1, 1)]),
            side_of(vec![Unit::new("b", 10, 1, 1, 1)]),
        );
        assert_eq!(state.outcome(), None);
    }

    #[test]
    fn test_outcome_winner_when_other_side_defeated() {
        let mut fallen = Unit::new("b", 10, 1, 1, 1);
        fallen.hp = 0;
        let state = BattleState::new(
            side_of(vec![Unit::new("a", 10, 1, 1, 1)]),
            side_of(vec![fallen]),
        );
        assert_eq!(state.outcome(), Some(Outcome::Winner(Seat::One)));
    }

    #[test]
    fn test_integrity_check_rejects_active_out_of_range() {
        let mut state = BattleState::new(
            side_of(vec![Unit::new("a", 10, 1, 1, 1)]),
            side_of(vec![Unit::new("b", 10, 1, 1, 1)]),
        );
        assert!(state.integrity_check().is_ok());

        state.side_mut(Seat::Two).active = 4;
        let err = state.integrity_check().unwrap_err();
        assert!(err.contains("seat-2"), "got: {err}");
    }

    #[test]
    fn test_integrity_check_rejects_overhealed_unit() {
        let mut state = BattleState::new(
            side_of(vec![Unit::new("a", 10, 1, 1, 1)]),
            side_of(vec![Unit::new("b", 10, 1, 1, 1)]),
        );
        state.side_mut(Seat::One).roster[0].hp = 11;
        assert!(state.integrity_check().is_err());
    }
}
