//! Battle rules for the wizard duel server.
//!
//! Two halves with no shared state and no locking:
//!
//! - [`validate`]: may this seat submit these actions and swaps?
//! - [`TurnResolver`]: given both seats' validated orders, what happens?
//!
//! Both are plain functions of their inputs. The turn synchronizer in
//! `wizard-turn` decides *when* they run; this crate only decides *what*
//! they return.
//!
//! # Key types
//!
//! - [`BattleState`] / [`Side`] / [`Unit`]: the state being fought over
//! - [`RulesConfig`]: per-game submission limits
//! - [`Rejection`]: why a submission is illegal
//! - [`TurnResult`] / [`TurnEvent`]: what a resolved turn produced
//! - [`StandardResolver`]: the reference rules engine

mod config;
mod error;
mod resolve;
mod state;
mod validate;

pub use config::RulesConfig;
pub use error::{Rejection, ResolveError};
pub use resolve::{
    Resolution, SideOrders, StandardResolver, TurnEvent, TurnOrders, TurnResolver,
    TurnResult,
};
pub use state::{BattleState, Inventory, MoveSlot, Outcome, Side, Unit};
pub use validate::validate;
