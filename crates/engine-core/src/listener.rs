//! Run-scoped progress notifications.
//!
//! The engine never writes to a global sink; callers inject a listener and
//! decide where progress goes. [`TracingListener`] forwards to `tracing`.

use crate::report::{MappingReport, RunReport};
use model::{mapping::TableMapping, pagination::cursor::Cursor};
use tracing::{error, info, warn};
use uuid::Uuid;

/// A page that was written and confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEvent {
    pub collection: String,
    pub page: u64,
    pub rows: usize,
    pub cursor: Cursor,
    pub reset: bool,
}

pub trait SyncListener: Send + Sync {
    fn run_started(&self, _run_id: Uuid, _source_version: &str) {}

    fn mapping_started(&self, _mapping: &TableMapping) {}

    fn page_loaded(&self, _event: &PageEvent) {}

    fn mapping_finished(&self, _report: &MappingReport) {}

    fn run_finished(&self, _report: &RunReport) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl SyncListener for TracingListener {
    fn run_started(&self, run_id: Uuid, source_version: &str) {
        info!(%run_id, source_version, "Sync run started");
    }

    fn mapping_started(&self, mapping: &TableMapping) {
        info!(
            table = %mapping.source_table,
            collection = %mapping.target_collection,
            cursor = %mapping.last_sync_cursor,
            page_size = %mapping.page_size,
            "Mapping started"
        );
    }

    fn page_loaded(&self, event: &PageEvent) {
        info!(
            collection = %event.collection,
            page = event.page,
            rows = event.rows,
            cursor = %event.cursor,
            "Page loaded"
        );
    }

    fn mapping_finished(&self, report: &MappingReport) {
        match &report.error {
            Some(err) => error!(
                table = %report.source_table,
                status = %report.status,
                cursor = %report.final_cursor,
                error = %err,
                "Mapping failed"
            ),
            None => info!(
                table = %report.source_table,
                status = %report.status,
                rows = report.rows_copied,
                pages = report.pages,
                cursor = %report.final_cursor,
                "Mapping finished"
            ),
        }
    }

    fn run_finished(&self, report: &RunReport) {
        if report.cancelled {
            warn!(total_rows = report.total_rows, "Sync run cancelled");
        } else {
            info!(
                total_rows = report.total_rows,
                mappings = report.mappings.len(),
                failed = report.failed().count(),
                duration_ms = report.duration_ms(),
                "Sync run finished"
            );
        }
    }
}
