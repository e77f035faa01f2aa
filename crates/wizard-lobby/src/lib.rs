//! Lobbies for the wizard duel server.
//!
//! A lobby pairs two matched players, issues each a secret token, and holds
//! the game they are currently playing.
//!
//! # How it fits in the stack
//!
//! ```text
//! Service (above)  ← authenticates a request, finds the lobby's game
//!     ↕
//! Lobby layer (this crate)  ← player identity and game ownership
//!     ↕
//! Turn layer (below)  ← per-game readiness and resolution
//! ```

mod error;
mod lobby;
mod registry;

pub use error::LobbyError;
pub use lobby::{Lobby, LobbyPlayer};
pub use registry::LobbyRegistry;
