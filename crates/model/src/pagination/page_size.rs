use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of rows fetched per round trip for one mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageSize(usize);

impl PageSize {
    pub const DEFAULT: usize = 500;

    /// Non-positive requests fall back to [`PageSize::DEFAULT`].
    pub fn new(requested: i64) -> Self {
        if requested <= 0 {
            PageSize(Self::DEFAULT)
        } else {
            PageSize(usize::try_from(requested).unwrap_or(usize::MAX))
        }
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize(Self::DEFAULT)
    }
}

impl From<i64> for PageSize {
    fn from(requested: i64) -> Self {
        PageSize::new(requested)
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
