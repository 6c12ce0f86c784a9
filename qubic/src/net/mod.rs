//! Real-time broadcast components: the outbound message protocol and the
//! per-game fan-out hub.

pub mod hub;
pub mod messages;

pub use hub::{Broadcaster, GameHub};
pub use messages::{GameMessage, MessageStatus, MoveBody};
