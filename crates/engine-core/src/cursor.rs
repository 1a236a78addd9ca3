use crate::error::SyncError;
use model::{pagination::cursor::Cursor, records::row::RowData};
use serde::Serialize;

/// State threaded from one page to the next within a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PageStep {
    pub cursor: Cursor,
    pub rows_seen: u64,
}

impl PageStep {
    pub fn start(cursor: Cursor) -> Self {
        PageStep {
            cursor,
            rows_seen: 0,
        }
    }
}

/// Decides when a mapping has to start from scratch and how the cursor moves.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    table: String,
    start: Cursor,
}

impl CursorTracker {
    pub fn new(table: &str, start: Cursor) -> Self {
        CursorTracker {
            table: table.to_string(),
            start,
        }
    }

    pub fn start(&self) -> Cursor {
        self.start
    }

    /// True when the mapping started without a cursor.
    pub fn is_reset(&self) -> bool {
        self.start.is_none()
    }

    /// The target must be cleared before the next page exactly when the run
    /// started without a cursor and nothing has been loaded yet.
    pub fn requires_reset(&self, pages_loaded: u64) -> bool {
        self.is_reset() && pages_loaded == 0
    }

    /// Moves the cursor to the ordinal of the last row of a loaded page.
    /// An empty page leaves the step untouched.
    pub fn next_cursor(&self, current: PageStep, rows: &[RowData]) -> Result<PageStep, SyncError> {
        let Some(last) = rows.last() else {
            return Ok(current);
        };

        let ordinal = last.ordinal().ok_or_else(|| {
            SyncError::mapping(&self.table, "last row of the page has no readable ordinal")
        })?;

        if let Some(previous) = current.cursor.ordinal() {
            if ordinal <= previous {
                return Err(SyncError::mapping(
                    &self.table,
                    format!("cursor would move from {previous} to {ordinal}"),
                ));
            }
        }

        Ok(PageStep {
            cursor: Cursor::Ordinal(ordinal),
            rows_seen: current.rows_seen + rows.len() as u64,
        })
    }
}
