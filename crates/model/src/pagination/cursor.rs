use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Position of a mapping inside its source table.
///
/// The cursor is the surrogate ordinal (`RowID`) of the last row that was
/// written to the target, never a primary-key value. Its persisted form is a
/// decimal string, where the empty string means "start over".
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Cursor {
    /// No rows synced yet: the next run performs a full resync.
    #[default]
    None,

    /// Ordinal of the last confirmed row.
    Ordinal(u64),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid sync cursor '{0}': expected an empty value or a non-negative integer")]
pub struct CursorParseError(pub String);

impl Cursor {
    pub fn is_none(&self) -> bool {
        matches!(self, Cursor::None)
    }

    pub fn ordinal(&self) -> Option<u64> {
        match self {
            Cursor::None => None,
            Cursor::Ordinal(value) => Some(*value),
        }
    }
}

impl FromStr for Cursor {
    type Err = CursorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Cursor::None);
        }
        trimmed
            .parse::<u64>()
            .map(Cursor::Ordinal)
            .map_err(|_| CursorParseError(s.to_string()))
    }
}

impl TryFrom<String> for Cursor {
    type Error = CursorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cursor> for String {
    fn from(cursor: Cursor) -> Self {
        cursor.to_string()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::None => Ok(()),
            Cursor::Ordinal(value) => write!(f, "{value}"),
        }
    }
}
