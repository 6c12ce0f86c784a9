//! The 4x4x4 occupancy grid.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Cells per board axis.
pub const BOARD_DIM: usize = 4;

/// Occupant of a single cell.
///
/// Serialized as the integer the wire and storage formats use:
/// EMPTY = -1, PLAYER1 = 1, PLAYER2 = 2.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CellMark {
    Empty,
    Player1,
    Player2,
}

impl CellMark {
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Empty => -1,
            Self::Player1 => 1,
            Self::Player2 => 2,
        }
    }
}

impl TryFrom<i8> for CellMark {
    type Error = i8;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Empty),
            1 => Ok(Self::Player1),
            2 => Ok(Self::Player2),
            other => Err(other),
        }
    }
}

impl Serialize for CellMark {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

impl<'de> Deserialize<'de> for CellMark {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i8::deserialize(deserializer)?;
        Self::try_from(value).map_err(|v| de::Error::custom(format!("invalid cell mark: {v}")))
    }
}

/// The fully-allocated 64-cell grid, indexed `[level][row][column]`.
///
/// Serializes as nested integer arrays, the shape the `board_state` column
/// and the original wire format carry.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[[CellMark; BOARD_DIM]; BOARD_DIM]; BOARD_DIM],
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: [[[CellMark::Empty; BOARD_DIM]; BOARD_DIM]; BOARD_DIM],
        }
    }
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current occupant of a cell.
    ///
    /// Coordinates must already be range-checked by the caller; out-of-range
    /// indices are a programming error and panic.
    #[must_use]
    pub fn cell_at(&self, level: usize, row: usize, column: usize) -> CellMark {
        self.cells[level][row][column]
    }

    #[must_use]
    pub fn is_empty_at(&self, level: usize, row: usize, column: usize) -> bool {
        self.cell_at(level, row, column) == CellMark::Empty
    }

    /// Write a mark into a cell. Emptiness is the caller's responsibility;
    /// the validator checks it before any placement.
    pub fn place(&mut self, level: usize, row: usize, column: usize, mark: CellMark) {
        self.cells[level][row][column] = mark;
    }
}
