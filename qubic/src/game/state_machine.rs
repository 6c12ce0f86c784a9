//! Game lifecycle state machine and turn arbitration.
//!
//! The lifecycle is an explicit transition table: each row names its event,
//! the states it may fire from, the target state, an optional guard, and an
//! optional before-effect applied together with the state write. Turn
//! toggling is deliberately separate from the lifecycle machine; it is the
//! only way `current_turn` changes while a game is in progress.

use std::fmt;
use thiserror::Error;

use super::entities::{Game, GameStatus, HistoryEntry, MoveRecord, UserId};

/// Lifecycle events a game can receive.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LifecycleEvent {
    /// `waiting` -> `in_progress`, guarded by player2 being present.
    Start,
    /// `in_progress` -> `complete`. Completion is externally triggered;
    /// nothing in the engine derives it from board state.
    Complete,
    /// `waiting` | `in_progress` -> `abandoned`.
    Abandon,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Abandon => "abandon",
        };
        write!(f, "{repr}")
    }
}

/// Errors from lifecycle transitions. The game is left untouched on error.
#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("cannot {event} a game that is {from}")]
    InvalidTransition {
        event: LifecycleEvent,
        from: GameStatus,
    },

    #[error("guard rejected {event}")]
    GuardFailed { event: LifecycleEvent },
}

type Guard = fn(&Game) -> bool;
type Effect = fn(&mut Game, &[MoveRecord]);

/// One row of the transition table.
struct Transition {
    event: LifecycleEvent,
    from: &'static [GameStatus],
    to: GameStatus,
    guard: Option<Guard>,
    before: Option<Effect>,
}

fn has_player2(game: &Game) -> bool {
    game.player2.is_some()
}

/// Terminal before-effect: turn ownership reverts to player1 and the full
/// chronological move history is materialized onto the game. No-op for the
/// history when the game has no recorded moves.
fn finalize(game: &mut Game, moves: &[MoveRecord]) {
    game.current_turn = game.player1;
    if !moves.is_empty() {
        let mut ordered: Vec<&MoveRecord> = moves.iter().collect();
        ordered.sort_by_key(|m| m.created_at);
        game.move_history = Some(ordered.into_iter().map(HistoryEntry::from).collect());
    }
}

const TRANSITIONS: &[Transition] = &[
    Transition {
        event: LifecycleEvent::Start,
        from: &[GameStatus::Waiting],
        to: GameStatus::InProgress,
        guard: Some(has_player2),
        before: None,
    },
    Transition {
        event: LifecycleEvent::Complete,
        from: &[GameStatus::InProgress],
        to: GameStatus::Complete,
        guard: None,
        before: Some(finalize),
    },
    Transition {
        event: LifecycleEvent::Abandon,
        from: &[GameStatus::Waiting, GameStatus::InProgress],
        to: GameStatus::Abandoned,
        guard: None,
        before: Some(finalize),
    },
];

impl Game {
    /// Apply a lifecycle event.
    ///
    /// `moves` is the game's recorded move list, consumed by terminal
    /// before-effects to materialize `move_history`. The before-effect and
    /// the state write happen together; on any error the game is unchanged.
    pub fn apply(
        &mut self,
        event: LifecycleEvent,
        moves: &[MoveRecord],
    ) -> Result<(), TransitionError> {
        let transition = TRANSITIONS
            .iter()
            .find(|t| t.event == event && t.from.contains(&self.status))
            .ok_or(TransitionError::InvalidTransition {
                event,
                from: self.status,
            })?;

        if let Some(guard) = transition.guard
            && !guard(self)
        {
            return Err(TransitionError::GuardFailed { event });
        }

        if let Some(before) = transition.before {
            before(self, moves);
        }
        self.status = transition.to;
        Ok(())
    }

    /// Flip turn ownership to the participant who is not `mover`, returning
    /// the new turn owner. Callers invoke this exactly once per move
    /// persisted with `is_valid = true`.
    pub fn toggle_turn(&mut self, mover: UserId) -> Option<UserId> {
        let next = self.opponent_of(mover)?;
        self.current_turn = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_transition_fires_from_a_terminal_state() {
        for transition in TRANSITIONS {
            for from in transition.from {
                assert!(!from.is_terminal(), "{} fires from {from}", transition.event);
            }
        }
    }

    #[test]
    fn guard_failure_leaves_the_game_untouched() {
        let mut game = Game::new(1, 10);
        let before = game.clone();

        let err = game.apply(LifecycleEvent::Start, &[]).unwrap_err();

        assert_eq!(
            err,
            TransitionError::GuardFailed {
                event: LifecycleEvent::Start
            }
        );
        assert_eq!(game, before);
    }

    #[test]
    fn toggle_turn_requires_a_participant() {
        let mut game = Game::new(1, 10);
        game.player2 = Some(20);

        assert_eq!(game.toggle_turn(30), None);
        assert_eq!(game.current_turn, 10);

        assert_eq!(game.toggle_turn(10), Some(20));
        assert_eq!(game.current_turn, 20);
    }
}
