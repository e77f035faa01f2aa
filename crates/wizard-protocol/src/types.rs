//! Core protocol types for the duel server's wire format.
//!
//! Everything in this module travels between a client and the server:
//! the identifiers a client quotes back to us, the actions it may pick for
//! its active unit, and the turn submission payload itself.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Newtype over `u64` so a `PlayerId` can never be passed where a
/// `LobbyId` is expected. `#[serde(transparent)]` keeps the JSON shape a
/// plain number: `PlayerId(42)` is `42` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a lobby (one matched pair of players).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyId(pub u64);

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

/// A unique identifier for one game instance inside a lobby.
///
/// A lobby can host several games over its lifetime (a rematch gets a
/// fresh `GameId`), but never more than one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// The secret a player presents with every submission.
///
/// Bound to a player when the lobby is created and never reassigned. The
/// same value addresses the player's connection when broadcasting.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerToken(String);

impl PlayerToken {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares against a presented token in time that depends only on
    /// the lengths, not on where the first differing byte is. Use this
    /// instead of `==` when checking a credential.
    pub fn matches(&self, presented: &PlayerToken) -> bool {
        let (ours, theirs) = (self.0.as_bytes(), presented.0.as_bytes());
        if ours.len() != theirs.len() {
            return false;
        }
        ours.iter().zip(theirs).fold(0u8, |diff, (a, b)| diff | (a ^ b)) == 0
    }
}

/// Tokens are secrets: debug output only shows a short prefix so they
/// never end up whole in logs.
impl fmt::Debug for PlayerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(4).collect();
        write!(f, "PlayerToken({prefix}…)")
    }
}

// ---------------------------------------------------------------------------
// Seat
// ---------------------------------------------------------------------------

/// A player's fixed position in a two-player match.
///
/// Lobby positions are 1-based on the wire (`1 | 2`); internally a seat
/// doubles as an index into `[T; 2]` arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    One,
    Two,
}

impl Seat {
    /// Both seats in canonical order.
    pub const BOTH: [Seat; 2] = [Seat::One, Seat::Two];

    /// Array index for this seat (`0` or `1`).
    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// Lobby position for this seat (`1` or `2`).
    pub fn position(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Maps a 1-based lobby position back to a seat.
    pub fn from_position(position: u8) -> Option<Self> {
        match position {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    /// The opposing seat.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat-{}", self.position())
    }
}

// ---------------------------------------------------------------------------
// Actions and swaps
// ---------------------------------------------------------------------------

/// Consumable items a player can carry into a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Restores a small amount of health to the active unit.
    Potion,
    /// Restores a large amount of health to the active unit.
    HyperPotion,
    /// Refills every move's PP on the active unit.
    Ether,
}

/// What a player's active unit attempts to do this turn.
///
/// A closed set: the validator and the resolver both match on it
/// exhaustively, so adding a variant is a compile error until every rule
/// handles it.
///
/// Internally tagged on the wire:
///   `{ "kind": "attack", "move_slot": 0 }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Use the move in the given slot of the active unit.
    Attack { move_slot: usize },
    /// Consume one item from the player's inventory.
    UseItem { item: ItemKind },
    /// Brace for the turn, halving incoming damage.
    Guard,
}

/// A roster index to make active at the start of the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Swap(pub usize);

impl fmt::Display for Swap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TurnRequest: the inbound submission payload
// ---------------------------------------------------------------------------

/// One player's submission for the current turn.
///
/// Field names are the ones clients already send to `/game/turn`.
/// All five are required; a payload missing any of them fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub lobby_id: LobbyId,
    pub player_id: PlayerId,
    pub token: PlayerToken,
    pub turn_actions: Vec<Action>,
    pub turn_swap: Vec<Swap>,
}
