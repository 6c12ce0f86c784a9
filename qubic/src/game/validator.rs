//! Pure move-legality decision logic.
//!
//! The validator mutates nothing and reports every applicable failure in one
//! pass. Two exceptions shape the error list: payload-format failures are
//! terminal and handled before the validator runs, and a game that is not in
//! progress aborts all later checks.

use super::entities::{Game, GameStatus, UserId};
use super::payload::{MoveField, NormalizedMove};

/// Upper bound (exclusive) for each coordinate.
const COORD_LIMIT: i64 = 4;

fn below_minimum(field: MoveField) -> String {
    format!("{field} must be greater than or equal to 0")
}

fn above_maximum(field: MoveField) -> String {
    format!("{field} must be less than {COORD_LIMIT}")
}

/// Message for a coordinate absent from the original payload.
///
/// Absent fields surface with the below-minimum wording. The wording is part
/// of the wire contract clients already match on; keep it verbatim.
#[must_use]
pub fn missing_field_message(field: MoveField) -> String {
    below_minimum(field)
}

/// Decide whether `user_id` may place `mv` on `game`.
///
/// Checks run in order: numeric range per field, participant, game state
/// (aborts the rest when the game is not in progress), turn ownership, and
/// cell occupancy. The occupancy check is skipped when any coordinate is out
/// of range. All failures accumulate into one list.
pub fn validate_move(game: &Game, user_id: UserId, mv: &NormalizedMove) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let mut in_range = true;

    for field in MoveField::ALL {
        let value = mv.value(field);
        if value < 0 {
            errors.push(below_minimum(field));
            in_range = false;
        } else if value >= COORD_LIMIT {
            errors.push(above_maximum(field));
            in_range = false;
        }
    }

    if !game.is_participant(user_id) {
        errors.push("User must be a participant in the game".to_string());
    }

    if game.status != GameStatus::InProgress {
        errors.push("Game must be in progress".to_string());
        return Err(errors);
    }

    if game.current_turn != user_id {
        errors.push("User must be the current turn player".to_string());
    }

    if in_range
        && !game
            .board
            .is_empty_at(mv.level as usize, mv.row as usize, mv.column as usize)
    {
        errors.push("Position is already taken".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::CellMark;
    use crate::game::state_machine::LifecycleEvent;

    const U1: UserId = 1;
    const U2: UserId = 2;

    fn in_progress_game() -> Game {
        let mut game = Game::new(1, U1);
        game.player2 = Some(U2);
        game.apply(LifecycleEvent::Start, &[]).unwrap();
        game
    }

    #[test]
    fn legal_move_validates_clean() {
        let game = in_progress_game();
        assert_eq!(validate_move(&game, U1, &NormalizedMove::new(0, 3, 2)), Ok(()));
    }

    #[test]
    fn negative_coordinates_are_named_per_field() {
        let game = in_progress_game();
        let errors = validate_move(&game, U1, &NormalizedMove::new(-1, 0, -1)).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Level must be greater than or equal to 0".to_string(),
                "Row must be greater than or equal to 0".to_string(),
            ]
        );
    }

    #[test]
    fn too_large_coordinates_are_named_per_field() {
        let game = in_progress_game();
        let errors = validate_move(&game, U1, &NormalizedMove::new(4, 7, 0)).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Level must be less than 4".to_string(),
                "Column must be less than 4".to_string(),
            ]
        );
    }

    #[test]
    fn non_participant_is_rejected() {
        let game = in_progress_game();
        let errors = validate_move(&game, 99, &NormalizedMove::new(0, 0, 0)).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "User must be a participant in the game".to_string(),
                "User must be the current turn player".to_string(),
            ]
        );
    }

    #[test]
    fn stopped_game_aborts_later_checks() {
        // A waiting game with a stranger moving onto an occupied cell: only
        // the checks up to and including the game-state check may report.
        let mut game = Game::new(1, U1);
        game.board.place(0, 0, 0, CellMark::Player1);

        let errors = validate_move(&game, 99, &NormalizedMove::new(0, 0, 0)).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "User must be a participant in the game".to_string(),
                "Game must be in progress".to_string(),
            ]
        );
    }

    #[test]
    fn wrong_turn_is_rejected() {
        let game = in_progress_game();
        let errors = validate_move(&game, U2, &NormalizedMove::new(0, 1, 2)).unwrap_err();

        assert_eq!(errors, vec!["User must be the current turn player".to_string()]);
    }

    #[test]
    fn occupied_cell_is_rejected_regardless_of_turn() {
        let mut game = in_progress_game();
        game.board.place(2, 1, 3, CellMark::Player1);

        // Move targets [level=2, column=3, row=1], the occupied cell.
        let errors = validate_move(&game, U2, &NormalizedMove::new(2, 3, 1)).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "User must be the current turn player".to_string(),
                "Position is already taken".to_string(),
            ]
        );
    }

    #[test]
    fn occupancy_check_skipped_when_out_of_range() {
        let game = in_progress_game();
        let errors = validate_move(&game, U1, &NormalizedMove::new(5, 0, 0)).unwrap_err();

        assert_eq!(errors, vec!["Level must be less than 4".to_string()]);
    }
}
