//! Repository trait definitions for testability and dependency injection.
//!
//! This module provides trait-based abstractions over database operations,
//! enabling better testing through mock implementations and dependency
//! injection. The Postgres implementations own every SQL statement the
//! engine issues; move commits are the one multi-statement transaction.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use thiserror::Error;

use crate::game::board::{Board, CellMark};
use crate::game::entities::{Game, GameId, GameStatus, HistoryEntry, MoveRecord, UserId};
use crate::game::payload::NormalizedMove;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Game row does not exist
    #[error("Game not found")]
    GameNotFound,

    /// Another joiner won the guarded join write
    #[error("Game is not joinable")]
    JoinConflict,

    /// Another writer finalized the game first
    #[error("Game is not open for that transition")]
    LifecycleConflict,

    /// The locked game row no longer satisfies turn/occupancy/status; the
    /// concurrent winner committed first.
    #[error("Move lost a concurrent commit race")]
    MoveConflict,

    /// Stored state failed to decode
    #[error("Stored game state is corrupt: {0}")]
    Corrupt(String),
}

/// Result type for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Game and move repository operations.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Create a game in `waiting` with `player1` as creator and turn holder.
    async fn create_game(&self, player1: UserId) -> StoreResult<Game>;

    /// Find game by ID
    async fn find_game(&self, game_id: GameId) -> StoreResult<Option<Game>>;

    /// Waiting games the user could join (not their own), newest first.
    async fn list_joinable(&self, user_id: UserId) -> StoreResult<Vec<Game>>;

    /// Games the user participates in, most recently updated first.
    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Game>>;

    /// Persist a join (`player2` + started status), guarded so only one
    /// concurrent joiner wins.
    async fn save_join(&self, game: &Game) -> StoreResult<()>;

    /// Persist a terminal transition (status, forced turn, move history),
    /// guarded against racing with another terminal write.
    async fn finalize_game(&self, game: &Game) -> StoreResult<()>;

    /// All recorded moves of a game in creation order.
    async fn list_moves(&self, game_id: GameId) -> StoreResult<Vec<MoveRecord>>;

    /// Persist a rejected attempt with `is_valid = false`, bypassing
    /// validation so the attempt stays auditable.
    async fn record_attempt(
        &self,
        game_id: GameId,
        user_id: UserId,
        mv: &NormalizedMove,
    ) -> StoreResult<MoveRecord>;

    /// Atomically persist a valid move, write the mover's mark into the
    /// board, and flip the current turn — one transaction. Fails with
    /// [`StoreError::MoveConflict`] when the locked row no longer satisfies
    /// turn, occupancy, or status.
    async fn commit_move(
        &self,
        game_id: GameId,
        user_id: UserId,
        mv: &NormalizedMove,
        mark: CellMark,
        next_turn: UserId,
    ) -> StoreResult<MoveRecord>;
}

/// Presence bookkeeping.
///
/// All operations are best-effort from the caller's perspective; a failure
/// here must never block or fail a move.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create or refresh the presence record for (game, user).
    async fn upsert_session(
        &self,
        game_id: GameId,
        user_id: UserId,
        session_id: &str,
    ) -> StoreResult<()>;

    /// Refresh `last_seen_at` for (game, user).
    async fn touch_session(&self, game_id: GameId, user_id: UserId) -> StoreResult<()>;

    /// Delete presence records for (game, user).
    async fn delete_sessions(&self, game_id: GameId, user_id: UserId) -> StoreResult<()>;
}

/// Default PostgreSQL implementation of [`GameStore`].
pub struct PgGameStore {
    pool: PgPool,
}

impl PgGameStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const GAME_COLUMNS: &str = "id, status, player1_id, player2_id, current_turn_id, winner_id,
                            board_state, move_history, created_at, updated_at";

fn game_from_row(row: &PgRow) -> StoreResult<Game> {
    let status: String = row.get("status");
    let status = status
        .parse::<GameStatus>()
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

    let board: serde_json::Value = row.get("board_state");
    let board: Board = serde_json::from_value(board)
        .map_err(|e| StoreError::Corrupt(format!("board_state: {e}")))?;

    let move_history = match row.get::<Option<serde_json::Value>, _>("move_history") {
        Some(value) => Some(
            serde_json::from_value::<Vec<HistoryEntry>>(value)
                .map_err(|e| StoreError::Corrupt(format!("move_history: {e}")))?,
        ),
        None => None,
    };

    Ok(Game {
        id: row.get("id"),
        status,
        player1: row.get("player1_id"),
        player2: row.get("player2_id"),
        current_turn: row.get("current_turn_id"),
        winner: row.get("winner_id"),
        board,
        move_history,
        created_at: row.get::<NaiveDateTime, _>("created_at").and_utc(),
        updated_at: row.get::<NaiveDateTime, _>("updated_at").and_utc(),
    })
}

fn move_from_row(row: &PgRow) -> MoveRecord {
    MoveRecord {
        id: row.get("id"),
        game_id: row.get("game_id"),
        user_id: row.get("user_id"),
        level: row.get("level"),
        column: row.get("column"),
        row: row.get("row"),
        is_valid: row.get("is_valid"),
        created_at: row.get::<NaiveDateTime, _>("created_at").and_utc(),
    }
}

async fn insert_move(
    tx: &mut Transaction<'_, Postgres>,
    game_id: GameId,
    user_id: UserId,
    mv: &NormalizedMove,
    is_valid: bool,
) -> StoreResult<MoveRecord> {
    let row = sqlx::query(
        r#"INSERT INTO game_moves (game_id, user_id, level, "column", "row", is_valid)
           VALUES ($1, $2, $3, $4, $5, $6)
           RETURNING id, created_at"#,
    )
    .bind(game_id)
    .bind(user_id)
    .bind(mv.level)
    .bind(mv.column)
    .bind(mv.row)
    .bind(is_valid)
    .fetch_one(&mut **tx)
    .await?;

    Ok(MoveRecord {
        id: row.get("id"),
        game_id,
        user_id,
        level: mv.level,
        column: mv.column,
        row: mv.row,
        is_valid,
        created_at: row.get::<NaiveDateTime, _>("created_at").and_utc(),
    })
}

#[async_trait]
impl GameStore for PgGameStore {
    async fn create_game(&self, player1: UserId) -> StoreResult<Game> {
        let board = serde_json::to_value(Board::default())
            .map_err(|e| StoreError::Corrupt(format!("board_state: {e}")))?;

        let row = sqlx::query(&format!(
            "INSERT INTO games (status, player1_id, current_turn_id, board_state)
             VALUES ('waiting', $1, $1, $2)
             RETURNING {GAME_COLUMNS}"
        ))
        .bind(player1)
        .bind(board)
        .fetch_one(&self.pool)
        .await?;

        game_from_row(&row)
    }

    async fn find_game(&self, game_id: GameId) -> StoreResult<Option<Game>> {
        let row = sqlx::query(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(game_from_row).transpose()
    }

    async fn list_joinable(&self, user_id: UserId) -> StoreResult<Vec<Game>> {
        let rows = sqlx::query(&format!(
            "SELECT {GAME_COLUMNS} FROM games
             WHERE status = 'waiting' AND player1_id <> $1
             ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(game_from_row).collect()
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Game>> {
        let rows = sqlx::query(&format!(
            "SELECT {GAME_COLUMNS} FROM games
             WHERE player1_id = $1 OR player2_id = $1
             ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(game_from_row).collect()
    }

    async fn save_join(&self, game: &Game) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE games
             SET player2_id = $2, status = $3, updated_at = NOW()
             WHERE id = $1 AND status = 'waiting' AND player2_id IS NULL",
        )
        .bind(game.id)
        .bind(game.player2)
        .bind(game.status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::JoinConflict);
        }
        Ok(())
    }

    async fn finalize_game(&self, game: &Game) -> StoreResult<()> {
        let move_history = game
            .move_history
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("move_history: {e}")))?;

        let result = sqlx::query(
            "UPDATE games
             SET status = $2, current_turn_id = $3, move_history = $4, updated_at = NOW()
             WHERE id = $1 AND status IN ('waiting', 'in_progress')",
        )
        .bind(game.id)
        .bind(game.status.as_str())
        .bind(game.current_turn)
        .bind(move_history)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::LifecycleConflict);
        }
        Ok(())
    }

    async fn list_moves(&self, game_id: GameId) -> StoreResult<Vec<MoveRecord>> {
        let rows = sqlx::query(
            r#"SELECT id, game_id, user_id, level, "column", "row", is_valid, created_at
               FROM game_moves
               WHERE game_id = $1
               ORDER BY created_at ASC, id ASC"#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(move_from_row).collect())
    }

    async fn record_attempt(
        &self,
        game_id: GameId,
        user_id: UserId,
        mv: &NormalizedMove,
    ) -> StoreResult<MoveRecord> {
        let row = sqlx::query(
            r#"INSERT INTO game_moves (game_id, user_id, level, "column", "row", is_valid)
               VALUES ($1, $2, $3, $4, $5, FALSE)
               RETURNING id, created_at"#,
        )
        .bind(game_id)
        .bind(user_id)
        .bind(mv.level)
        .bind(mv.column)
        .bind(mv.row)
        .fetch_one(&self.pool)
        .await?;

        Ok(MoveRecord {
            id: row.get("id"),
            game_id,
            user_id,
            level: mv.level,
            column: mv.column,
            row: mv.row,
            is_valid: false,
            created_at: row.get::<NaiveDateTime, _>("created_at").and_utc(),
        })
    }

    async fn commit_move(
        &self,
        game_id: GameId,
        user_id: UserId,
        mv: &NormalizedMove,
        mark: CellMark,
        next_turn: UserId,
    ) -> StoreResult<MoveRecord> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE id = $1 FOR UPDATE"
        ))
        .bind(game_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::GameNotFound)?;
        let game = game_from_row(&row)?;

        // Recheck under the row lock: a concurrent winner already flipped the
        // turn or took the cell, and this writer must observe that and lose.
        let (level, board_row, column) = (mv.level as usize, mv.row as usize, mv.column as usize);
        if game.status != GameStatus::InProgress
            || game.current_turn != user_id
            || !game.board.is_empty_at(level, board_row, column)
        {
            return Err(StoreError::MoveConflict);
        }

        let record = insert_move(&mut tx, game_id, user_id, mv, true).await?;

        let path = vec![
            mv.level.to_string(),
            mv.row.to_string(),
            mv.column.to_string(),
        ];
        sqlx::query(
            "UPDATE games
             SET board_state = jsonb_set(board_state, $2, $3),
                 current_turn_id = $4,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(game_id)
        .bind(path)
        .bind(serde_json::json!(mark.as_i8()))
        .bind(next_turn)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }
}

/// Default PostgreSQL implementation of [`SessionStore`].
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn upsert_session(
        &self,
        game_id: GameId,
        user_id: UserId,
        session_id: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO game_sessions (game_id, user_id, session_id, last_seen_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (game_id, user_id)
             DO UPDATE SET session_id = EXCLUDED.session_id, last_seen_at = NOW()",
        )
        .bind(game_id)
        .bind(user_id)
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn touch_session(&self, game_id: GameId, user_id: UserId) -> StoreResult<()> {
        sqlx::query(
            "UPDATE game_sessions SET last_seen_at = NOW() WHERE game_id = $1 AND user_id = $2",
        )
        .bind(game_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_sessions(&self, game_id: GameId, user_id: UserId) -> StoreResult<()> {
        sqlx::query("DELETE FROM game_sessions WHERE game_id = $1 AND user_id = $2")
            .bind(game_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Mock implementation for testing
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store for exercising the move pipeline without a database.
    #[derive(Default)]
    pub struct MemoryGameStore {
        games: Mutex<HashMap<GameId, Game>>,
        moves: Mutex<Vec<MoveRecord>>,
        next_game_id: Mutex<GameId>,
    }

    impl MemoryGameStore {
        pub fn new() -> Self {
            Self {
                next_game_id: Mutex::new(1),
                ..Self::default()
            }
        }

        pub fn with_game(self, game: Game) -> Self {
            self.games.lock().unwrap().insert(game.id, game);
            self
        }

        /// Stored snapshot of a game; panics if absent.
        pub fn game(&self, game_id: GameId) -> Game {
            self.games.lock().unwrap().get(&game_id).cloned().unwrap()
        }

        pub fn recorded_moves(&self) -> Vec<MoveRecord> {
            self.moves.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GameStore for MemoryGameStore {
        async fn create_game(&self, player1: UserId) -> StoreResult<Game> {
            let mut next = self.next_game_id.lock().unwrap();
            let game = Game::new(*next, player1);
            *next += 1;
            self.games.lock().unwrap().insert(game.id, game.clone());
            Ok(game)
        }

        async fn find_game(&self, game_id: GameId) -> StoreResult<Option<Game>> {
            Ok(self.games.lock().unwrap().get(&game_id).cloned())
        }

        async fn list_joinable(&self, user_id: UserId) -> StoreResult<Vec<Game>> {
            Ok(self
                .games
                .lock()
                .unwrap()
                .values()
                .filter(|g| g.status == GameStatus::Waiting && g.player1 != user_id)
                .cloned()
                .collect())
        }

        async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Game>> {
            Ok(self
                .games
                .lock()
                .unwrap()
                .values()
                .filter(|g| g.is_participant(user_id))
                .cloned()
                .collect())
        }

        async fn save_join(&self, game: &Game) -> StoreResult<()> {
            let mut games = self.games.lock().unwrap();
            match games.get_mut(&game.id) {
                Some(stored)
                    if stored.status == GameStatus::Waiting && stored.player2.is_none() =>
                {
                    *stored = game.clone();
                    Ok(())
                }
                Some(_) => Err(StoreError::JoinConflict),
                None => Err(StoreError::GameNotFound),
            }
        }

        async fn finalize_game(&self, game: &Game) -> StoreResult<()> {
            let mut games = self.games.lock().unwrap();
            match games.get_mut(&game.id) {
                Some(stored) if !stored.status.is_terminal() => {
                    *stored = game.clone();
                    Ok(())
                }
                Some(_) => Err(StoreError::LifecycleConflict),
                None => Err(StoreError::GameNotFound),
            }
        }

        async fn list_moves(&self, game_id: GameId) -> StoreResult<Vec<MoveRecord>> {
            let mut moves: Vec<MoveRecord> = self
                .moves
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.game_id == game_id)
                .cloned()
                .collect();
            moves.sort_by_key(|m| (m.created_at, m.id));
            Ok(moves)
        }

        async fn record_attempt(
            &self,
            game_id: GameId,
            user_id: UserId,
            mv: &NormalizedMove,
        ) -> StoreResult<MoveRecord> {
            let mut moves = self.moves.lock().unwrap();
            let record = MoveRecord {
                id: moves.len() as i64 + 1,
                game_id,
                user_id,
                level: mv.level,
                column: mv.column,
                row: mv.row,
                is_valid: false,
                created_at: Utc::now(),
            };
            moves.push(record.clone());
            Ok(record)
        }

        async fn commit_move(
            &self,
            game_id: GameId,
            user_id: UserId,
            mv: &NormalizedMove,
            mark: CellMark,
            next_turn: UserId,
        ) -> StoreResult<MoveRecord> {
            let mut games = self.games.lock().unwrap();
            let game = games.get_mut(&game_id).ok_or(StoreError::GameNotFound)?;

            let (level, row, column) = (mv.level as usize, mv.row as usize, mv.column as usize);
            if game.status != GameStatus::InProgress
                || game.current_turn != user_id
                || !game.board.is_empty_at(level, row, column)
            {
                return Err(StoreError::MoveConflict);
            }

            game.board.place(level, row, column, mark);
            game.current_turn = next_turn;
            game.updated_at = Utc::now();

            let mut moves = self.moves.lock().unwrap();
            let record = MoveRecord {
                id: moves.len() as i64 + 1,
                game_id,
                user_id,
                level: mv.level,
                column: mv.column,
                row: mv.row,
                is_valid: true,
                created_at: Utc::now(),
            };
            moves.push(record.clone());
            Ok(record)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn create_then_find_round_trips() {
            let store = MemoryGameStore::new();

            let game = store.create_game(10).await.unwrap();
            assert_eq!(game.player1, 10);
            assert_eq!(game.status, GameStatus::Waiting);

            let found = store.find_game(game.id).await.unwrap();
            assert_eq!(found, Some(game));
        }

        #[tokio::test]
        async fn joinable_excludes_own_games() {
            let store = MemoryGameStore::new();
            store.create_game(10).await.unwrap();
            store.create_game(20).await.unwrap();

            let joinable = store.list_joinable(10).await.unwrap();
            assert_eq!(joinable.len(), 1);
            assert_eq!(joinable[0].player1, 20);
        }

        #[tokio::test]
        async fn save_join_is_guarded() {
            let store = MemoryGameStore::new();
            let mut game = store.create_game(10).await.unwrap();
            game.player2 = Some(20);
            game.status = GameStatus::InProgress;

            store.save_join(&game).await.unwrap();

            // Second joiner races and loses.
            let mut late = game.clone();
            late.player2 = Some(30);
            assert!(matches!(
                store.save_join(&late).await,
                Err(StoreError::JoinConflict)
            ));
        }
    }
}
