//! Outbound broadcast message protocol.
//!
//! Wire shapes are a compatibility contract: snake_case keys, `type` and
//! `status` discriminators, and exactly the field sets below. Every
//! subscriber of a game's channel receives every message for that game.

use serde::{Deserialize, Serialize};

use crate::game::entities::{MoveRecord, UserId};

/// Broadcast status discriminator.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Success,
    Error,
}

/// The move fields echoed to subscribers on success.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MoveBody {
    pub level: i64,
    pub column: i64,
    pub row: i64,
    pub user_id: UserId,
}

/// A message published to every subscriber of a game's channel.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameMessage {
    /// Outcome of a processed move attempt.
    Move {
        status: MessageStatus,
        #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
        placed: Option<MoveBody>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_turn_id: Option<UserId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        errors: Option<Vec<String>>,
    },
    /// Presence change for a subscriber of the game's channel.
    PlayerStatus {
        status: MessageStatus,
        user_id: UserId,
        connected: bool,
    },
}

impl GameMessage {
    /// Success broadcast for a committed move. `current_turn_id` is the turn
    /// owner after the flip, used by clients to update turn indicators.
    #[must_use]
    pub fn move_success(record: &MoveRecord, current_turn_id: UserId) -> Self {
        Self::Move {
            status: MessageStatus::Success,
            placed: Some(MoveBody {
                level: record.level,
                column: record.column,
                row: record.row,
                user_id: record.user_id,
            }),
            current_turn_id: Some(current_turn_id),
            errors: None,
        }
    }

    #[must_use]
    pub fn move_error(errors: Vec<String>) -> Self {
        Self::Move {
            status: MessageStatus::Error,
            placed: None,
            current_turn_id: None,
            errors: Some(errors),
        }
    }

    #[must_use]
    pub fn player_status(user_id: UserId, connected: bool) -> Self {
        Self::PlayerStatus {
            status: MessageStatus::Success,
            user_id,
            connected,
        }
    }
}
