//! # Qubic
//!
//! A server-authoritative engine for real-time 4x4x4 tic-tac-toe: two players
//! take turns claiming cells of a three-dimensional grid, and every committed
//! move is broadcast live to all subscribers of the game's channel.
//!
//! The engine is built around a move pipeline: inbound payloads are
//! normalized into a canonical move shape, checked by a pure validator,
//! and committed by the move processor as one atomic storage transaction
//! (move row, board cell write, turn flip). Game lifecycle is an explicit
//! finite state machine with guarded transitions.
//!
//! ## Core Modules
//!
//! - [`game`]: Board, lifecycle state machine, move validation and processing
//! - [`db`]: PostgreSQL repositories and connection pooling
//! - [`net`]: Outbound message protocol and the per-game broadcast hub
//! - [`auth`]: Access-token verification at the identity boundary
//!
//! ## Example
//!
//! ```
//! use qubic::{Game, GameStatus};
//!
//! // Create a new game in the waiting state; its creator holds the turn.
//! let game = Game::new(1, 42);
//! assert_eq!(game.status, GameStatus::Waiting);
//! assert_eq!(game.current_turn, 42);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    BOARD_DIM, Board, CellMark, Game, GameId, GameStatus, LifecycleEvent, MovePayload,
    MoveProcessor, MoveRecord, ProcessOutcome, UserId,
};

/// Database repositories and connection pooling.
pub mod db;
pub use db::{Database, DatabaseConfig};

/// Real-time broadcast components.
pub mod net;
pub use net::{Broadcaster, GameHub, GameMessage};

/// Identity boundary (access-token verification).
pub mod auth;
pub use auth::AuthManager;
