//! Move processing: normalization, validation, atomic commit.
//!
//! The processor is the only component that writes into a board. Exactly one
//! move row is persisted per processed attempt, success or failure, with a
//! single exception: malformed sequence payloads are rejected before
//! persistence. Game-logic failures fold into the structured outcome;
//! only infrastructure failures propagate to the caller.

use log::{debug, warn};
use std::sync::Arc;

use super::entities::{Game, MoveRecord, UserId};
use super::payload::{INVALID_MOVE_FORMAT, MovePayload};
use super::validator::{missing_field_message, validate_move};
use crate::db::repository::{GameStore, StoreError, StoreResult};

/// Structured result of one processed move attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessOutcome {
    pub success: bool,
    pub game_move: Option<MoveRecord>,
    pub errors: Option<Vec<String>>,
}

impl ProcessOutcome {
    fn succeeded(game_move: MoveRecord) -> Self {
        Self {
            success: true,
            game_move: Some(game_move),
            errors: None,
        }
    }

    fn failed(errors: Vec<String>, game_move: Option<MoveRecord>) -> Self {
        Self {
            success: false,
            game_move,
            errors: Some(errors),
        }
    }
}

/// Orchestrates one move: payload normalization, validation, and the atomic
/// commit of move row, board cell write, and turn flip.
pub struct MoveProcessor<S> {
    store: Arc<S>,
}

impl<S: GameStore> MoveProcessor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Process a proposed move by `user_id` on `game`.
    ///
    /// `game` is the caller's snapshot; the store re-checks turn and
    /// occupancy under its row lock, so near-simultaneous movers serialize
    /// and the loser observes the winner's committed state.
    pub async fn process(
        &self,
        game: &Game,
        user_id: UserId,
        payload: MovePayload,
    ) -> StoreResult<ProcessOutcome> {
        let mv = match payload.normalize() {
            Ok(mv) => mv,
            Err(_) => {
                debug!(
                    "game {}: rejecting malformed move payload from user {user_id}",
                    game.id
                );
                return Ok(ProcessOutcome::failed(
                    vec![INVALID_MOVE_FORMAT.to_string()],
                    None,
                ));
            }
        };

        if mv.has_missing_fields() {
            let record = self.store.record_attempt(game.id, user_id, &mv).await?;
            let errors = mv
                .missing_fields()
                .into_iter()
                .map(missing_field_message)
                .collect();
            return Ok(ProcessOutcome::failed(errors, Some(record)));
        }

        if let Err(errors) = validate_move(game, user_id, &mv) {
            let record = self.store.record_attempt(game.id, user_id, &mv).await?;
            return Ok(ProcessOutcome::failed(errors, Some(record)));
        }

        // Validation guarantees a participant on an in-progress game, which
        // in turn guarantees both players are present. Fail closed if a
        // corrupt snapshot breaks that invariant.
        let (mark, next_turn) = match (game.mark_for(user_id), game.opponent_of(user_id)) {
            (Some(mark), Some(next_turn)) => (mark, next_turn),
            _ => {
                warn!(
                    "game {}: in-progress game is missing a participant",
                    game.id
                );
                return Err(StoreError::Corrupt("in-progress game without player2".into()));
            }
        };

        match self
            .store
            .commit_move(game.id, user_id, &mv, mark, next_turn)
            .await
        {
            Ok(record) => Ok(ProcessOutcome::succeeded(record)),
            Err(StoreError::MoveConflict) => {
                // Lost a concurrent commit race. Re-validate against the
                // committed state so the reported errors match what any later
                // arrival would have seen, then record the attempt.
                warn!(
                    "game {}: move by user {user_id} lost a concurrent commit race",
                    game.id
                );
                let fresh = self
                    .store
                    .find_game(game.id)
                    .await?
                    .ok_or(StoreError::GameNotFound)?;
                let errors = match validate_move(&fresh, user_id, &mv) {
                    Err(errors) => errors,
                    // Still valid against fresh state: the conflict was
                    // transient, surface it as an infrastructure fault.
                    Ok(()) => return Err(StoreError::MoveConflict),
                };
                let record = self.store.record_attempt(game.id, user_id, &mv).await?;
                Ok(ProcessOutcome::failed(errors, Some(record)))
            }
            Err(e) => Err(e),
        }
    }
}
