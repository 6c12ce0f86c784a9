//! Inbound move payload normalization.
//!
//! Clients may send a move as an ordered `[level, column, row]` triple or as
//! a keyed object. Both shapes resolve through one normalization step into
//! [`NormalizedMove`]: absent coordinates default to 0 so the attempt can
//! always be persisted, while the set of originally-missing fields is
//! tracked separately for error reporting.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Error message for a sequence payload of the wrong length.
pub const INVALID_MOVE_FORMAT: &str = "Invalid move format";

/// A move coordinate field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MoveField {
    Level,
    Column,
    Row,
}

impl MoveField {
    pub const ALL: [MoveField; 3] = [Self::Level, Self::Column, Self::Row];

    /// Capitalized name used in user-facing error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Level => "Level",
            Self::Column => "Column",
            Self::Row => "Row",
        }
    }

    const fn key(self) -> &'static str {
        match self {
            Self::Level => "level",
            Self::Column => "column",
            Self::Row => "row",
        }
    }
}

impl fmt::Display for MoveField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A sequence payload that does not carry exactly three elements. Terminal:
/// no attempt is persisted for this failure.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("{}", INVALID_MOVE_FORMAT)]
pub struct MoveFormatError;

/// Raw inbound move payload.
///
/// Any JSON value that is neither an array nor an object normalizes as an
/// empty keyed payload, i.e. every coordinate missing.
#[derive(Clone, Debug)]
pub enum MovePayload {
    Sequence(Vec<Value>),
    Keyed(Map<String, Value>),
}

impl From<Value> for MovePayload {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => Self::Keyed(map),
            _ => Self::Keyed(Map::new()),
        }
    }
}

impl MovePayload {
    /// Resolve the payload into a [`NormalizedMove`].
    ///
    /// Only a JSON integer counts as a present coordinate; everything else
    /// is recorded as missing and defaulted to 0 for persistence.
    pub fn normalize(self) -> Result<NormalizedMove, MoveFormatError> {
        let raw: [Option<i64>; 3] = match self {
            Self::Sequence(items) => {
                if items.len() != 3 {
                    return Err(MoveFormatError);
                }
                [items[0].as_i64(), items[1].as_i64(), items[2].as_i64()]
            }
            Self::Keyed(map) => {
                let field = |f: MoveField| map.get(f.key()).and_then(Value::as_i64);
                [
                    field(MoveField::Level),
                    field(MoveField::Column),
                    field(MoveField::Row),
                ]
            }
        };

        Ok(NormalizedMove {
            level: raw[0].unwrap_or(0),
            column: raw[1].unwrap_or(0),
            row: raw[2].unwrap_or(0),
            missing: [raw[0].is_none(), raw[1].is_none(), raw[2].is_none()],
        })
    }
}

/// A move with every coordinate materialized and the originally-missing
/// fields tracked separately.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NormalizedMove {
    pub level: i64,
    pub column: i64,
    pub row: i64,
    missing: [bool; 3],
}

impl NormalizedMove {
    /// A move with all coordinates present.
    #[must_use]
    pub const fn new(level: i64, column: i64, row: i64) -> Self {
        Self {
            level,
            column,
            row,
            missing: [false; 3],
        }
    }

    #[must_use]
    pub fn value(&self, field: MoveField) -> i64 {
        match field {
            MoveField::Level => self.level,
            MoveField::Column => self.column,
            MoveField::Row => self.row,
        }
    }

    /// Fields absent from the original payload, in level/column/row order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<MoveField> {
        MoveField::ALL
            .into_iter()
            .zip(self.missing)
            .filter_map(|(field, missing)| missing.then_some(field))
            .collect()
    }

    #[must_use]
    pub fn has_missing_fields(&self) -> bool {
        self.missing.iter().any(|m| *m)
    }
}
