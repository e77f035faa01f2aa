//! Wire protocol for the wizard duel server.
//!
//! This crate defines what clients and the server exchange:
//!
//! - **Types** ([`TurnRequest`], [`Action`], [`Swap`], identifiers):
//!   the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! It knows nothing about lobbies, games, or locking; every other crate
//! in the workspace builds on these types.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Action, GameId, ItemKind, LobbyId, PlayerId, PlayerToken, Seat, Swap,
    TurnRequest,
};
