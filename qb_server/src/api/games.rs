//! Game lifecycle API handlers.
//!
//! HTTP REST endpoints around the real-time core: listing joinable games,
//! listing the caller's games, creating, joining, and abandoning. All
//! endpoints require authentication via JWT bearer token.
//!
//! # Examples
//!
//! Create a game:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/games \
//!   -H "Authorization: Bearer TOKEN"
//! ```
//!
//! Join a game:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/games/1/join \
//!   -H "Authorization: Bearer TOKEN"
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::error;

use qubic::{
    db::repository::{GameStore, StoreError},
    game::{
        entities::{Game, GameId, GameStatus, UserId},
        state_machine::LifecycleEvent,
    },
};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct GameSummary {
    pub id: GameId,
    pub status: String,
    pub player1_id: UserId,
    pub player2_id: Option<UserId>,
    pub current_turn_id: UserId,
    pub winner_id: Option<UserId>,
    pub updated_at: String,
}

impl From<&Game> for GameSummary {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            status: game.status.to_string(),
            player1_id: game.player1,
            player2_id: game.player2,
            current_turn_id: game.current_turn,
            winner_id: game.winner,
            updated_at: game.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal_error(e: impl std::fmt::Display) -> HandlerError {
    error!("request failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
}

fn not_found() -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Game not found".to_string(),
        }),
    )
}

fn unprocessable(message: &str) -> HandlerError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

/// List games the caller could join: waiting games created by someone else,
/// newest first.
pub async fn list_games(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<GameSummary>>, HandlerError> {
    let games = state
        .games
        .list_joinable(user_id)
        .await
        .map_err(internal_error)?;

    Ok(Json(games.iter().map(GameSummary::from).collect()))
}

/// List the caller's games, most recently updated first.
pub async fn my_games(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<GameSummary>>, HandlerError> {
    let games = state
        .games
        .list_for_user(user_id)
        .await
        .map_err(internal_error)?;

    Ok(Json(games.iter().map(GameSummary::from).collect()))
}

/// Create a game. The caller becomes player1 and holds the first turn; the
/// game waits for a second player.
pub async fn create_game(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<(StatusCode, Json<GameSummary>), HandlerError> {
    let game = state
        .games
        .create_game(user_id)
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(GameSummary::from(&game))))
}

/// Join a waiting game as player2 and start it.
///
/// Joinable only when the game is waiting and the caller is not its creator.
/// The persistence layer re-guards the write, so of two concurrent joiners
/// exactly one wins.
pub async fn join_game(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(game_id): Path<GameId>,
) -> Result<Json<GameSummary>, HandlerError> {
    let mut game = state
        .games
        .find_game(game_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(not_found)?;

    if game.status != GameStatus::Waiting || game.player1 == user_id {
        return Err(unprocessable("Game is not available to join."));
    }

    game.player2 = Some(user_id);
    game.apply(LifecycleEvent::Start, &[])
        .map_err(|_| unprocessable("Game cannot be started."))?;

    match state.games.save_join(&game).await {
        Ok(()) => Ok(Json(GameSummary::from(&game))),
        Err(StoreError::JoinConflict) => Err(unprocessable("Game is not available to join.")),
        Err(e) => Err(internal_error(e)),
    }
}

/// Abandon a game the caller participates in.
///
/// Permitted from `waiting` and `in_progress`. The terminal transition
/// forces the turn back to player1 and archives the move history.
pub async fn abandon_game(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(game_id): Path<GameId>,
) -> Result<Json<GameSummary>, HandlerError> {
    let mut game = state
        .games
        .find_game(game_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(not_found)?;

    if !game.is_participant(user_id) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "You cannot abandon this game.".to_string(),
            }),
        ));
    }

    let moves = state
        .games
        .list_moves(game_id)
        .await
        .map_err(internal_error)?;

    game.apply(LifecycleEvent::Abandon, &moves)
        .map_err(|_| unprocessable("Could not abandon the game."))?;

    match state.games.finalize_game(&game).await {
        Ok(()) => Ok(Json(GameSummary::from(&game))),
        Err(StoreError::LifecycleConflict) => Err(unprocessable("Could not abandon the game.")),
        Err(e) => Err(internal_error(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mirrors_the_game_row() {
        let mut game = Game::new(5, 10);
        game.player2 = Some(20);

        let summary = GameSummary::from(&game);

        assert_eq!(summary.id, 5);
        assert_eq!(summary.status, "waiting");
        assert_eq!(summary.player1_id, 10);
        assert_eq!(summary.player2_id, Some(20));
        assert_eq!(summary.current_turn_id, 10);
        assert_eq!(summary.winner_id, None);
    }
}
