//! Per-game broadcast fan-out.

use log::debug;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

use super::messages::GameMessage;
use crate::game::entities::GameId;

/// Capacity of each per-game channel. A subscriber that lags this far behind
/// misses the overflow rather than blocking publishers.
const CHANNEL_CAPACITY: usize = 64;

/// A publish capability over per-game channels.
///
/// Injected into callers rather than reached for globally, so the fan-out
/// sink stays swappable. Implementations perform no validation; they are
/// pure sinks keyed by game id.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, game_id: GameId, message: GameMessage);
}

/// In-process hub of per-game tokio broadcast channels.
#[derive(Default)]
pub struct GameHub {
    channels: Mutex<HashMap<GameId, broadcast::Sender<GameMessage>>>,
}

impl GameHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all messages for a game's channel, creating the channel
    /// on first use.
    pub fn subscribe(&self, game_id: GameId) -> broadcast::Receiver<GameMessage> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(game_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }
}

impl Broadcaster for GameHub {
    fn publish(&self, game_id: GameId, message: GameMessage) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let delivered = match channels.get(&game_id) {
            Some(sender) => sender.send(message).is_ok(),
            None => return,
        };
        if !delivered {
            // The last subscriber is gone; reclaim the channel.
            channels.remove(&game_id);
            debug!("dropped empty broadcast channel for game {game_id}");
        }
    }
}
