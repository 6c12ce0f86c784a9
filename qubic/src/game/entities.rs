//! Core game data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use super::board::{Board, CellMark};

/// User ID type
pub type UserId = i64;

/// Game ID type
pub type GameId = i64;

/// Lifecycle status of a game session.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    InProgress,
    Complete,
    Abandoned,
}

impl GameStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
            Self::Abandoned => "abandoned",
        }
    }

    /// Terminal states are immutable with respect to further moves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Abandoned)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error parsing a stored status column.
#[derive(Debug, Error, PartialEq)]
#[error("unknown game status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for GameStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "in_progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            "abandoned" => Ok(Self::Abandoned),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A persisted move attempt.
///
/// Invalid and malformed attempts are stored too (with `is_valid = false`)
/// so every attempt stays auditable; only `is_valid = true` rows ever flip
/// turn ownership.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MoveRecord {
    pub id: i64,
    pub game_id: GameId,
    pub user_id: UserId,
    pub level: i64,
    pub column: i64,
    pub row: i64,
    pub is_valid: bool,
    pub created_at: DateTime<Utc>,
}

/// One entry of the finalized move-history archive, materialized onto the
/// game when it reaches a terminal state.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub user_id: UserId,
    pub level: i64,
    pub column: i64,
    pub row: i64,
    pub created_at: DateTime<Utc>,
    pub is_valid: bool,
}

impl From<&MoveRecord> for HistoryEntry {
    fn from(record: &MoveRecord) -> Self {
        Self {
            user_id: record.user_id,
            level: record.level,
            column: record.column,
            row: record.row,
            created_at: record.created_at,
            is_valid: record.is_valid,
        }
    }
}

/// One game session: players, turn state, board, and lifecycle status.
///
/// The game owns its board and turn state exclusively; only the move
/// processor writes into the board, and only after validation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Game {
    pub id: GameId,
    pub status: GameStatus,
    pub player1: UserId,
    pub player2: Option<UserId>,
    pub current_turn: UserId,
    pub winner: Option<UserId>,
    pub board: Board,
    pub move_history: Option<Vec<HistoryEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    /// A fresh game in `waiting`: the creator is player1 and holds the turn,
    /// and the board is fully allocated with every cell empty.
    #[must_use]
    pub fn new(id: GameId, player1: UserId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: GameStatus::Waiting,
            player1,
            player2: None,
            current_turn: player1,
            winner: None,
            board: Board::default(),
            move_history: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.player1 == user_id || self.player2 == Some(user_id)
    }

    #[must_use]
    pub fn has_player2(&self) -> bool {
        self.player2.is_some()
    }

    /// The board mark belonging to a participant.
    #[must_use]
    pub fn mark_for(&self, user_id: UserId) -> Option<CellMark> {
        if user_id == self.player1 {
            Some(CellMark::Player1)
        } else if Some(user_id) == self.player2 {
            Some(CellMark::Player2)
        } else {
            None
        }
    }

    /// The participant who is not `user_id`.
    #[must_use]
    pub fn opponent_of(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.player1 {
            self.player2
        } else if Some(user_id) == self.player2 {
            Some(self.player1)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_waits_with_creator_on_turn() {
        let game = Game::new(1, 42);

        assert_eq!(game.status, GameStatus::Waiting);
        assert_eq!(game.player1, 42);
        assert_eq!(game.current_turn, 42);
        assert!(game.player2.is_none());
        assert!(game.winner.is_none());
        assert!(game.move_history.is_none());
        assert!(game.board.is_empty_at(0, 0, 0));
    }

    #[test]
    fn participant_and_opponent_resolution() {
        let mut game = Game::new(1, 10);
        game.player2 = Some(20);

        assert!(game.is_participant(10));
        assert!(game.is_participant(20));
        assert!(!game.is_participant(30));

        assert_eq!(game.opponent_of(10), Some(20));
        assert_eq!(game.opponent_of(20), Some(10));
        assert_eq!(game.opponent_of(30), None);

        assert_eq!(game.mark_for(10), Some(CellMark::Player1));
        assert_eq!(game.mark_for(20), Some(CellMark::Player2));
        assert_eq!(game.mark_for(30), None);
    }

    #[test]
    fn status_round_trips_through_storage_strings() {
        for status in [
            GameStatus::Waiting,
            GameStatus::InProgress,
            GameStatus::Complete,
            GameStatus::Abandoned,
        ] {
            assert_eq!(status.as_str().parse::<GameStatus>().unwrap(), status);
        }
        assert!("paused".parse::<GameStatus>().is_err());
    }

    #[test]
    fn only_complete_and_abandoned_are_terminal() {
        assert!(!GameStatus::Waiting.is_terminal());
        assert!(!GameStatus::InProgress.is_terminal());
        assert!(GameStatus::Complete.is_terminal());
        assert!(GameStatus::Abandoned.is_terminal());
    }
}
