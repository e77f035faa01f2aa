//! Delivering game events to connected players.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use wizard_protocol::PlayerToken;

use crate::GameEvent;

/// Channel sender for delivering events to one player.
pub type EventSender = mpsc::UnboundedSender<GameEvent>;

/// Receiving half handed to a connected player.
pub type EventReceiver = mpsc::UnboundedReceiver<GameEvent>;

/// Fire-and-forget delivery of events to players, addressed by token.
///
/// Called while the game lock is held, so implementations must not block
/// or wait on the network. Delivery failures (disconnected players,
/// unknown tokens) are swallowed: the game never fails because someone
/// stopped listening.
pub trait Broadcaster: Send + Sync + 'static {
    fn send(&self, recipients: &[PlayerToken], event: &GameEvent);
}

impl<B: Broadcaster> Broadcaster for Arc<B> {
    fn send(&self, recipients: &[PlayerToken], event: &GameEvent) {
        (**self).send(recipients, event)
    }
}

/// In-process broadcaster backed by one unbounded channel per player.
///
/// Unbounded, so `send` never waits on a slow reader.
#[derive(Debug, Default)]
pub struct ChannelBroadcaster {
    senders: RwLock<HashMap<PlayerToken, EventSender>>,
}

impl ChannelBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a player and returns the receiver their events arrive on.
    ///
    /// Connecting the same token again replaces the old channel; the old
    /// receiver sees the stream end.
    pub fn connect(&self, token: PlayerToken) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.write().insert(token, tx);
        rx
    }

    /// Removes a player's channel. Returns `false` if they weren't connected.
    pub fn disconnect(&self, token: &PlayerToken) -> bool {
        self.write().remove(token).is_some()
    }

    pub fn connection_count(&self) -> usize {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // A panic elsewhere never leaves the map half-updated, so a poisoned
    // lock is still safe to use.
    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<PlayerToken, EventSender>> {
        self.senders.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn send(&self, recipients: &[PlayerToken], event: &GameEvent) {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
        for token in recipients {
            if let Some(sender) = senders.get(token) {
                let _ = sender.send(event.clone());
            }
        }
    }
}
