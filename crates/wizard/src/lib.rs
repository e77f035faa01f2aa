//! # Wizard
//!
//! Turn submission service for a two-player, simultaneous-turn battle game.
//!
//! Both players submit their actions for a turn independently. The service
//! authenticates each submission against its lobby, validates it, and
//! resolves the turn exactly once when the second valid submission lands.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wizard::prelude::*;
//!
//! # async fn run(battle: BattleState) -> Result<(), WizardError> {
//! let registry = Arc::new(LobbyRegistry::new());
//! let broadcaster = Arc::new(ChannelBroadcaster::new());
//! let service = TurnService::new(
//!     Arc::clone(&registry),
//!     StandardResolver::new(),
//!     broadcaster,
//!     ServiceConfig::default(),
//! );
//!
//! let lobby = registry.create_lobby(PlayerId(1), PlayerId(2)).await;
//! service.start_game(lobby.id(), battle).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod service;

pub use config::ServiceConfig;
pub use error::WizardError;
pub use service::{TurnAck, TurnReply, TurnService};

/// Everything needed to run a turn service.
pub mod prelude {
    pub use crate::{ServiceConfig, TurnAck, TurnReply, TurnService, WizardError};
    pub use wizard_battle::{
        BattleState, Inventory, Outcome, Rejection, RulesConfig, Side, StandardResolver,
        TurnEvent, TurnResolver, TurnResult, Unit, validate,
    };
    pub use wizard_lobby::{Lobby, LobbyError, LobbyRegistry};
    pub use wizard_protocol::{
        Action, Codec, ItemKind, JsonCodec, LobbyId, PlayerId, PlayerToken, Seat, Swap,
        TurnRequest,
    };
    pub use wizard_turn::{
        Broadcaster, ChannelBroadcaster, EventReceiver, GameEvent, TurnError, TurnPhase,
    };
}
