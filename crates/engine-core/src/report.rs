use crate::{error::SyncError, metrics::MetricsSnapshot};
use chrono::{DateTime, Utc};
use model::pagination::cursor::Cursor;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MappingStatus {
    Done,
    Failed,
    Cancelled,
}

impl MappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingStatus::Done => "Done",
            MappingStatus::Failed => "Failed",
            MappingStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one mapping within a run.
#[derive(Debug, Clone, Serialize)]
pub struct MappingReport {
    pub source_table: String,
    pub target_collection: String,
    pub status: MappingStatus,
    pub rows_copied: u64,
    pub pages: u64,
    pub start_cursor: Cursor,
    /// Cursor of the last confirmed page, or the start cursor if none was.
    pub final_cursor: Cursor,
    /// Whether the target collection was cleared during this run.
    pub reset: bool,
    pub error: Option<String>,
    pub error_kind: Option<&'static str>,
    pub duration_ms: u64,
}

impl MappingReport {
    pub fn is_success(&self) -> bool {
        self.status == MappingStatus::Done
    }

    /// True when the final cursor should be persisted: the mapping finished,
    /// or stopped after at least one confirmed page.
    pub fn has_progress(&self) -> bool {
        self.status == MappingStatus::Done || self.pages > 0
    }

    pub fn fail(&mut self, err: &SyncError) {
        self.status = MappingStatus::Failed;
        self.error = Some(err.to_string());
        self.error_kind = Some(err.kind());
    }
}

/// Summary of a whole run, in configured mapping order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source_version: String,
    pub total_rows: u64,
    pub mappings: Vec<MappingReport>,
    pub cancelled: bool,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &MappingReport> {
        self.mappings
            .iter()
            .filter(|m| m.status == MappingStatus::Failed)
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.mappings.iter().all(MappingReport::is_success)
    }

    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}
