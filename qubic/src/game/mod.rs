//! Game engine core: the board, the lifecycle state machine, and the move
//! pipeline (payload normalization, validation, processing).

pub mod board;
pub mod entities;
pub mod payload;
pub mod processor;
pub mod state_machine;
pub mod validator;

pub use board::{BOARD_DIM, Board, CellMark};
pub use entities::{Game, GameId, GameStatus, HistoryEntry, MoveRecord, UserId};
pub use payload::{MoveField, MoveFormatError, MovePayload, NormalizedMove};
pub use processor::{MoveProcessor, ProcessOutcome};
pub use state_machine::{LifecycleEvent, TransitionError};
pub use validator::validate_move;
