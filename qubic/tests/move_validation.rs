//! Payload normalization and move validation through the public API.

use proptest::prelude::*;
use serde_json::json;

use qubic::game::board::CellMark;
use qubic::game::entities::{Game, UserId};
use qubic::game::payload::{MoveField, MovePayload, NormalizedMove};
use qubic::game::state_machine::LifecycleEvent;
use qubic::game::validator::validate_move;

const U1: UserId = 1;
const U2: UserId = 2;

fn in_progress_game() -> Game {
    let mut game = Game::new(1, U1);
    game.player2 = Some(U2);
    game.apply(LifecycleEvent::Start, &[]).unwrap();
    game
}

#[test]
fn sequence_payload_validates_like_its_keyed_twin() {
    let game = in_progress_game();

    let from_seq = MovePayload::from(json!([0, 1, 2])).normalize().unwrap();
    let from_map = MovePayload::from(json!({ "level": 0, "column": 1, "row": 2 }))
        .normalize()
        .unwrap();

    assert_eq!(from_seq, from_map);
    assert_eq!(validate_move(&game, U1, &from_seq), Ok(()));
}

#[test]
fn zero_and_three_are_valid_boundaries() {
    let game = in_progress_game();

    assert_eq!(validate_move(&game, U1, &NormalizedMove::new(0, 0, 0)), Ok(()));
    assert_eq!(validate_move(&game, U1, &NormalizedMove::new(3, 3, 3)), Ok(()));
}

#[test]
fn minus_one_and_four_are_rejected_with_field_messages() {
    let game = in_progress_game();

    let low = validate_move(&game, U1, &NormalizedMove::new(-1, 0, 0)).unwrap_err();
    assert_eq!(low, vec!["Level must be greater than or equal to 0".to_string()]);

    let high = validate_move(&game, U1, &NormalizedMove::new(0, 4, 0)).unwrap_err();
    assert_eq!(high, vec!["Column must be less than 4".to_string()]);
}

#[test]
fn keyed_payload_reports_each_missing_field() {
    let mv = MovePayload::from(json!({ "row": 2 })).normalize().unwrap();

    assert_eq!(
        mv.missing_fields(),
        vec![MoveField::Level, MoveField::Column]
    );
    assert_eq!((mv.level, mv.column, mv.row), (0, 0, 2));
}

#[test]
fn occupied_cell_is_rejected_for_both_players() {
    let mut game = in_progress_game();
    game.board.place(1, 3, 2, CellMark::Player1);

    // Move [level=1, column=2, row=3] targets the occupied cell.
    let mv = NormalizedMove::new(1, 2, 3);

    let current_turn = validate_move(&game, U1, &mv).unwrap_err();
    assert_eq!(current_turn, vec!["Position is already taken".to_string()]);

    let off_turn = validate_move(&game, U2, &mv).unwrap_err();
    assert!(off_turn.contains(&"Position is already taken".to_string()));
}

#[test]
fn game_state_failure_suppresses_turn_and_occupancy_checks() {
    let mut game = in_progress_game();
    game.board.place(0, 0, 0, CellMark::Player1);
    game.apply(LifecycleEvent::Abandon, &[]).unwrap();

    let errors = validate_move(&game, U2, &NormalizedMove::new(0, 0, 0)).unwrap_err();

    assert_eq!(errors, vec!["Game must be in progress".to_string()]);
}

proptest! {
    #[test]
    fn every_in_range_cell_is_playable_on_an_empty_board(
        level in 0i64..4,
        column in 0i64..4,
        row in 0i64..4,
    ) {
        let game = in_progress_game();
        let mv = NormalizedMove::new(level, column, row);
        prop_assert_eq!(validate_move(&game, U1, &mv), Ok(()));
    }

    #[test]
    fn every_out_of_range_coordinate_is_named(
        level in -8i64..12,
        column in -8i64..12,
        row in -8i64..12,
    ) {
        prop_assume!(
            !(0..4).contains(&level) || !(0..4).contains(&column) || !(0..4).contains(&row)
        );

        let game = in_progress_game();
        let mv = NormalizedMove::new(level, column, row);
        let errors = validate_move(&game, U1, &mv).unwrap_err();

        for (field, value) in [
            (MoveField::Level, level),
            (MoveField::Column, column),
            (MoveField::Row, row),
        ] {
            if !(0..4).contains(&value) {
                prop_assert!(errors.iter().any(|e| e.starts_with(field.name())));
            }
        }
    }
}
