use engine_core::report::RunReport;
use model::mapping::{SyncSettings, TableName};
use tracing::debug;

/// Copies final cursors from a run back into the settings so the next run
/// resumes where this one stopped. Mappings without confirmed progress keep
/// their previous cursor. Returns the number of mappings updated.
pub fn apply_report(settings: &mut SyncSettings, report: &RunReport) -> usize {
    let mut updated = 0;

    for outcome in report.mappings.iter().filter(|m| m.has_progress()) {
        let Ok(table) = outcome.source_table.parse::<TableName>() else {
            continue;
        };
        if let Some(mapping) = settings.mapping_mut(&table, &outcome.target_collection) {
            if mapping.last_sync_cursor != outcome.final_cursor {
                debug!(
                    table = %table,
                    from = %mapping.last_sync_cursor,
                    to = %outcome.final_cursor,
                    "Cursor updated"
                );
                mapping.last_sync_cursor = outcome.final_cursor;
                updated += 1;
            }
        }
    }

    updated
}
