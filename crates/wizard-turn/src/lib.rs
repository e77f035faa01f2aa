//! Turn synchronization for the wizard duel server.
//!
//! Both players of a game submit their orders for a turn independently
//! and in any order, possibly at the same instant. This crate makes sure
//! the turn is resolved exactly once, after both submissions are in and
//! before either player sees the result.
//!
//! Each game sits behind its own `tokio::sync::Mutex` ([`SharedGame`]);
//! there is no global lock.
//!
//! # Key types
//!
//! - [`Game`]: readiness tracker and phase for one match
//! - [`TurnPhase`]: Collecting → Resolving → Resolved → Collecting/GameOver
//! - [`TurnSync`]: the submission protocol and the single resolution
//! - [`Broadcaster`] / [`ChannelBroadcaster`]: pushing [`GameEvent`]s
//!   to players

mod broadcast;
mod error;
mod event;
mod game;
mod phase;
mod sync;

pub use broadcast::{Broadcaster, ChannelBroadcaster, EventReceiver, EventSender};
pub use error::TurnError;
pub use event::GameEvent;
pub use game::{Game, PlayerSlot, ResolutionTicket, SharedGame};
pub use phase::TurnPhase;
pub use sync::{Submission, SubmitOutcome, TurnSync};
