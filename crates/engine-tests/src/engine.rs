#[cfg(test)]
mod tests {
    use crate::utils::{
        FakeSource, FakeStore, ORDER_COLUMNS, RecordingListener, SQL_SERVER_2000, TARGET_CONN,
        fast_options, mapping, settings,
    };
    use connectors::document::bson::doc;
    use engine_core::{
        error::SyncError,
        report::{MappingStatus, RunReport},
    };
    use engine_runtime::execution::executor::SyncEngine;
    use model::{core::value::Value, mapping::SyncSettings, pagination::cursor::Cursor};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    async fn run(
        source: &Arc<FakeSource>,
        store: &Arc<FakeStore>,
        settings: &SyncSettings,
    ) -> RunReport {
        SyncEngine::new(source.clone(), store.clone())
            .with_options(fast_options())
            .run(settings)
            .await
            .unwrap()
    }

    // Scenario: 1200 rows, no cursor, page size 500.
    // Expected Outcome:
    // - Three pages are read with cursors none, 500 and 1000.
    // - The collection is cleared once, before the first page.
    // - The final cursor is 1200 and every row is in the target.
    #[traced_test]
    #[tokio::test]
    async fn test_full_copy_in_pages() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 1200));
        let store = Arc::new(FakeStore::new());
        store.seed("orders", order_documents(3));

        let report = run(&source, &store, &settings(vec![mapping("Orders", "orders", 500)])).await;
        let orders = &report.mappings[0];

        assert_eq!(orders.status, MappingStatus::Done);
        assert_eq!(orders.final_cursor, Cursor::Ordinal(1200));
        assert_eq!(orders.rows_copied, 1200);
        assert_eq!(orders.pages, 3);
        assert!(orders.reset);

        assert_eq!(
            source.fetched_cursors("Orders"),
            vec![Cursor::None, Cursor::Ordinal(500), Cursor::Ordinal(1000)]
        );
        assert_eq!(store.clears(), vec!["orders".to_string()]);
        assert_eq!(store.documents("orders").len(), 1200);

        assert_eq!(report.total_rows, 1200);
        assert_eq!(report.metrics.pages_loaded, 3);
        assert_eq!(report.metrics.collections_cleared, 1);
        assert!(logs_contain("Sync run finished"));
    }

    // Scenario: Cursor 7, page size 10, 30 rows in the source.
    // Expected Outcome: The first page holds ordinals 8 to 17 and the target is never cleared.
    #[tokio::test]
    async fn test_resume_from_cursor() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 30));
        let store = Arc::new(FakeStore::new());
        let listener = Arc::new(RecordingListener::default());
        let settings = settings(vec![
            mapping("Orders", "orders", 10).with_cursor(Cursor::Ordinal(7)),
        ]);

        let report = SyncEngine::new(source.clone(), store.clone())
            .with_options(fast_options())
            .with_listener(listener.clone())
            .run(&settings)
            .await
            .unwrap();

        let documents = store.documents("orders");
        let first_page: Vec<i64> = documents[..10]
            .iter()
            .map(|d| d.get_i64("RowID").unwrap())
            .collect();
        assert_eq!(first_page, (8..=17).collect::<Vec<i64>>());

        assert!(store.clears().is_empty());
        assert_eq!(documents.len(), 23);
        assert_eq!(report.mappings[0].final_cursor, Cursor::Ordinal(30));
        assert!(!report.mappings[0].reset);
        assert_eq!(
            listener.page_cursors("orders"),
            vec![Cursor::Ordinal(17), Cursor::Ordinal(27), Cursor::Ordinal(30)]
        );
    }

    // Scenario: Several source sizes against one page size.
    // Expected Outcome: A fresh run loads ceil(N / P) non-empty pages and copies N rows.
    #[tokio::test]
    async fn test_page_count_matches_row_count() {
        for rows in [1usize, 9, 10, 11, 25] {
            let source = Arc::new(FakeSource::new().with_orders("Orders", rows));
            let store = Arc::new(FakeStore::new());

            let report = run(&source, &store, &settings(vec![mapping("Orders", "orders", 10)])).await;
            let orders = &report.mappings[0];

            assert_eq!(orders.pages, rows.div_ceil(10) as u64, "rows = {rows}");
            assert_eq!(orders.rows_copied, rows as u64);
            assert_eq!(orders.final_cursor, Cursor::Ordinal(rows as u64));
            assert_eq!(store.documents("orders").len(), rows);
        }
    }

    // Scenario: The table has exactly one full page of rows.
    // Expected Outcome: A trailing empty page is read and does not count as a page.
    #[tokio::test]
    async fn test_trailing_empty_page() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 10));
        let store = Arc::new(FakeStore::new());

        let report = run(&source, &store, &settings(vec![mapping("Orders", "orders", 10)])).await;

        assert_eq!(report.mappings[0].pages, 1);
        assert_eq!(
            source.fetched_cursors("Orders"),
            vec![Cursor::None, Cursor::Ordinal(10)]
        );
    }

    // Scenario: An empty source table with no cursor, and a target holding stale documents.
    // Expected Outcome: The target is still cleared; the cursor stays empty.
    #[tokio::test]
    async fn test_empty_table_still_resets_target() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 0));
        let store = Arc::new(FakeStore::new());
        store.seed("orders", order_documents(5));

        let report = run(&source, &store, &settings(vec![mapping("Orders", "orders", 10)])).await;
        let orders = &report.mappings[0];

        assert_eq!(orders.status, MappingStatus::Done);
        assert_eq!(orders.final_cursor, Cursor::None);
        assert_eq!(orders.pages, 0);
        assert!(orders.reset);
        assert!(store.documents("orders").is_empty());
    }

    // Scenario: The source table reports no columns.
    // Expected Outcome: The mapping completes with zero rows and no page query is issued.
    #[tokio::test]
    async fn test_zero_column_table() {
        let source = Arc::new(FakeSource::new().with_table("Audit", &[], vec![]));
        let store = Arc::new(FakeStore::new());

        let report = run(&source, &store, &settings(vec![mapping("Audit", "audit", 10)])).await;

        assert_eq!(report.mappings[0].status, MappingStatus::Done);
        assert_eq!(report.mappings[0].rows_copied, 0);
        assert!(source.fetched_cursors("Audit").is_empty());
        assert!(store.clears().is_empty());
    }

    // Scenario: The target acknowledges fewer documents than sent on the second page.
    // Expected Outcome:
    // - The mapping fails with a load count mismatch.
    // - The cursor stays at the last fully confirmed page.
    #[traced_test]
    #[tokio::test]
    async fn test_short_insert_keeps_previous_cursor() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 1200));
        let store = Arc::new(FakeStore::new().short_insert_on("orders", 2));

        let report = run(&source, &store, &settings(vec![mapping("Orders", "orders", 500)])).await;
        let orders = &report.mappings[0];

        assert_eq!(orders.status, MappingStatus::Failed);
        assert_eq!(orders.error_kind, Some("load_count_mismatch"));
        assert_eq!(orders.final_cursor, Cursor::Ordinal(500));
        assert_eq!(orders.rows_copied, 500);
        assert_eq!(orders.pages, 1);
        assert!(orders.has_progress());
        assert_eq!(report.metrics.rows_read, 500);
        assert_eq!(report.metrics.failed_mappings, 1);
        assert!(logs_contain("Mapping failed"));
    }

    // Scenario: The source reports SQL Server 2000.
    // Expected Outcome: The run is rejected before any mapping starts.
    #[tokio::test]
    async fn test_old_server_is_rejected() {
        let source = Arc::new(
            FakeSource::new()
                .with_version(SQL_SERVER_2000)
                .with_orders("Orders", 10),
        );
        let store = Arc::new(FakeStore::new());

        let err = SyncEngine::new(source.clone(), store.clone())
            .with_options(fast_options())
            .run(&settings(vec![mapping("Orders", "orders", 10)]))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::UnsupportedVersion { .. }));
        assert!(source.fetched_cursors("Orders").is_empty());
        assert!(store.clears().is_empty());
    }

    // Scenario: The source connection string is missing.
    // Expected Outcome: A configuration error, raised before the server is contacted.
    #[tokio::test]
    async fn test_missing_connection_is_rejected() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 10));
        let store = Arc::new(FakeStore::new());
        let settings =
            SyncSettings::new("", TARGET_CONN).with_mapping(mapping("Orders", "orders", 10));

        let err = SyncEngine::new(source.clone(), store)
            .run(&settings)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Configuration(_)));
        assert!(err.is_run_scoped());
        assert_eq!(source.version_checks(), 0);
    }

    // Scenario: The first mapping names a table that does not exist.
    // Expected Outcome: It fails with a schema error and the next mapping still runs.
    #[tokio::test]
    async fn test_failed_mapping_does_not_stop_run() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 12));
        let store = Arc::new(FakeStore::new());
        let settings = settings(vec![
            mapping("Invoices", "invoices", 10),
            mapping("Orders", "orders", 10),
        ]);

        let report = run(&source, &store, &settings).await;

        assert_eq!(report.mappings[0].status, MappingStatus::Failed);
        assert_eq!(report.mappings[0].error_kind, Some("schema"));
        assert!(!report.mappings[0].has_progress());
        assert_eq!(report.mappings[1].status, MappingStatus::Done);
        assert_eq!(report.mappings[1].rows_copied, 12);
        assert_eq!(report.failed().count(), 1);
        assert!(!report.is_success());
    }

    // Scenario: Cancellation is requested while the first page is being confirmed.
    // Expected Outcome:
    // - No further page is read.
    // - The mapping is reported as cancelled with the cursor of the confirmed page.
    #[tokio::test]
    async fn test_cancel_after_first_page() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 1200));
        let store = Arc::new(FakeStore::new());
        let token = CancellationToken::new();
        let listener = Arc::new(RecordingListener::cancelling_after(1, token.clone()));

        let report = SyncEngine::new(source.clone(), store.clone())
            .with_options(fast_options())
            .with_listener(listener)
            .with_cancellation(token)
            .run(&settings(vec![mapping("Orders", "orders", 500)]))
            .await
            .unwrap();
        let orders = &report.mappings[0];

        assert!(report.cancelled);
        assert_eq!(orders.status, MappingStatus::Cancelled);
        assert_eq!(orders.final_cursor, Cursor::Ordinal(500));
        assert!(orders.has_progress());
        assert_eq!(source.fetched_cursors("Orders"), vec![Cursor::None]);
        assert_eq!(store.documents("orders").len(), 500);
    }

    // Scenario: A primary key column is configured.
    // Expected Outcome: Its value is written to `_id` and the column is not duplicated.
    #[tokio::test]
    async fn test_primary_key_becomes_identity() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 3));
        let store = Arc::new(FakeStore::new());

        run(&source, &store, &settings(vec![mapping("Orders", "orders", 10)])).await;

        let first = &store.documents("orders")[0];
        assert_eq!(first.get_i32("_id").unwrap(), 10);
        assert!(!first.contains_key("OrderID"));
        assert_eq!(first.get_str("Customer").unwrap(), "customer-1");
        assert_eq!(first.get_str("Total").unwrap(), "0.25");
        assert_eq!(first.get_i64("RowID").unwrap(), 1);
    }

    // Scenario: The same settings, without a cursor, run twice.
    // Expected Outcome: The target ends up with the same documents after each run.
    #[tokio::test]
    async fn test_rerun_from_scratch_is_idempotent() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 42));
        let store = Arc::new(FakeStore::new());
        let settings = settings(vec![mapping("Orders", "orders", 10)]);

        run(&source, &store, &settings).await;
        let first = store.documents("orders");
        run(&source, &store, &settings).await;

        assert_eq!(store.documents("orders"), first);
        assert_eq!(store.clears().len(), 2);
    }

    // Scenario: The first two page queries fail with a transient I/O error.
    // Expected Outcome: The page is retried, the mapping succeeds and the retries are counted.
    #[traced_test]
    #[tokio::test]
    async fn test_transient_fetch_failure_is_retried() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 5));
        let store = Arc::new(FakeStore::new());
        source.fail_next_fetches(2);

        let report = run(&source, &store, &settings(vec![mapping("Orders", "orders", 10)])).await;

        assert_eq!(report.mappings[0].status, MappingStatus::Done);
        assert_eq!(report.mappings[0].rows_copied, 5);
        assert_eq!(report.metrics.retries, 2);
        assert!(logs_contain("Transient failure, retrying"));
    }

    // Scenario: Transient failures outlast the retry budget.
    // Expected Outcome: The mapping fails with a connection error and nothing is written.
    #[tokio::test]
    async fn test_exhausted_retries_fail_mapping() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 5));
        let store = Arc::new(FakeStore::new());
        source.fail_next_fetches(10);

        let report = run(&source, &store, &settings(vec![mapping("Orders", "orders", 10)])).await;

        assert_eq!(report.mappings[0].status, MappingStatus::Failed);
        assert_eq!(report.mappings[0].error_kind, Some("connection"));
        assert_eq!(report.mappings[0].final_cursor, Cursor::None);
        assert!(store.documents("orders").is_empty());
    }

    // Scenario: The second insert is applied but its reply is lost to a dropped connection.
    // Expected Outcome:
    // - The retry removes the unconfirmed page before writing it again.
    // - The mapping completes with every row exactly once.
    #[traced_test]
    #[tokio::test]
    async fn test_lost_insert_reply_is_replayed_once() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 25));
        let store = Arc::new(FakeStore::new().lose_reply_on("orders", 2));

        let report = run(&source, &store, &settings(vec![mapping("Orders", "orders", 10)])).await;

        assert_eq!(report.mappings[0].status, MappingStatus::Done);
        assert_eq!(report.mappings[0].final_cursor, Cursor::Ordinal(25));
        assert_eq!(report.metrics.retries, 1);
        assert_eq!(report.metrics.rows_read, 25);

        let row_ids: Vec<i64> = store
            .documents("orders")
            .iter()
            .map(|d| d.get_i64("RowID").unwrap())
            .collect();
        assert_eq!(row_ids, (1..=25).collect::<Vec<i64>>());
        assert!(logs_contain("Removed unconfirmed documents"));
    }

    // Scenario: An earlier run wrote rows 8 and 9 but died before saving cursor 9.
    // Expected Outcome: The resumed run drops them first and rewrites them without a key clash.
    #[tokio::test]
    async fn test_resumed_run_drops_unconfirmed_rows() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 12));
        let store = Arc::new(FakeStore::new());
        store.seed(
            "orders",
            (1..=9)
                .map(|n| doc! { "_id": n * 10, "RowID": n as i64 })
                .collect(),
        );
        let settings = settings(vec![
            mapping("Orders", "orders", 10).with_cursor(Cursor::Ordinal(7)),
        ]);

        let report = run(&source, &store, &settings).await;

        assert_eq!(report.mappings[0].status, MappingStatus::Done);
        assert_eq!(report.mappings[0].final_cursor, Cursor::Ordinal(12));
        assert_eq!(store.documents("orders").len(), 12);
        assert!(store.clears().is_empty());
    }

    // Scenario: The target already holds an `_id` below the cursor that a new row also uses.
    // Expected Outcome: The mapping fails with a duplicate key error and is not retried.
    #[tokio::test]
    async fn test_duplicate_key_fails_mapping() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 12));
        let store = Arc::new(FakeStore::new());
        store.seed("orders", vec![doc! { "_id": 90, "RowID": 2_i64 }]);
        let settings = settings(vec![
            mapping("Orders", "orders", 10).with_cursor(Cursor::Ordinal(7)),
        ]);

        let report = run(&source, &store, &settings).await;
        let orders = &report.mappings[0];

        assert_eq!(orders.status, MappingStatus::Failed);
        assert_eq!(orders.error_kind, Some("duplicate_key"));
        assert_eq!(orders.final_cursor, Cursor::Ordinal(7));
        assert_eq!(report.metrics.retries, 0);
    }

    // Scenario: Keys were inserted out of order (30, 10, 20).
    // Expected Outcome: Ordinals follow the key order, not the insertion order.
    #[tokio::test]
    async fn test_ordinals_follow_ordering_key() {
        let rows = [30, 10, 20]
            .into_iter()
            .map(|id| vec![Value::Int(id), Value::String(format!("c{id}")), Value::Null])
            .collect();
        let source = Arc::new(FakeSource::new().with_table("Orders", ORDER_COLUMNS, rows));
        let store = Arc::new(FakeStore::new());

        run(&source, &store, &settings(vec![mapping("Orders", "orders", 2)])).await;

        let ranked: Vec<(i64, i32)> = store
            .documents("orders")
            .iter()
            .map(|d| (d.get_i64("RowID").unwrap(), d.get_i32("_id").unwrap()))
            .collect();
        assert_eq!(ranked, vec![(1, 10), (2, 20), (3, 30)]);
    }

    // Scenario: Three mappings run with three workers.
    // Expected Outcome: Reports come back in configured order.
    #[tokio::test]
    async fn test_parallel_mappings_keep_order() {
        let source = Arc::new(
            FakeSource::new()
                .with_orders("Orders", 300)
                .with_orders("Returns", 5)
                .with_orders("Archive", 120),
        );
        let store = Arc::new(FakeStore::new());
        let settings = settings(vec![
            mapping("Orders", "orders", 50),
            mapping("Returns", "returns", 50),
            mapping("Archive", "archive", 50),
        ]);

        let report = SyncEngine::new(source.clone(), store.clone())
            .with_options(fast_options().with_parallelism(3))
            .run(&settings)
            .await
            .unwrap();

        let collections: Vec<&str> = report
            .mappings
            .iter()
            .map(|m| m.target_collection.as_str())
            .collect();
        assert_eq!(collections, vec!["orders", "returns", "archive"]);
        assert_eq!(report.total_rows, 425);
        assert_eq!(store.documents("archive").len(), 120);
    }

    // Scenario: A table list is given on the command line.
    // Expected Outcome: Exactly the listed tables run, whatever their selected flag.
    #[tokio::test]
    async fn test_explicit_tables_override_selection() {
        let source = Arc::new(
            FakeSource::new()
                .with_orders("Orders", 4)
                .with_orders("Returns", 4),
        );
        let store = Arc::new(FakeStore::new());
        let settings = settings(vec![
            mapping("Orders", "orders", 10).with_selected(false),
            mapping("Returns", "returns", 10),
        ]);

        let report = SyncEngine::new(source.clone(), store.clone())
            .with_options(fast_options().with_tables(vec!["dbo.orders".into()]))
            .run(&settings)
            .await
            .unwrap();

        assert_eq!(report.mappings.len(), 1);
        assert_eq!(report.mappings[0].target_collection, "orders");
        assert!(store.documents("returns").is_empty());
    }

    // Scenario: Mappings marked as not selected.
    // Expected Outcome: They are skipped entirely.
    #[tokio::test]
    async fn test_unselected_mapping_is_skipped() {
        let source = Arc::new(FakeSource::new().with_orders("Orders", 4));
        let store = Arc::new(FakeStore::new());
        let settings = settings(vec![mapping("Orders", "orders", 10).with_selected(false)]);

        let report = run(&source, &store, &settings).await;

        assert!(report.mappings.is_empty());
        assert!(source.fetched_cursors("Orders").is_empty());
    }

    fn order_documents(count: usize) -> Vec<connectors::document::bson::Document> {
        (0..count)
            .map(|n| doc! { "stale": n as i32 })
            .collect()
    }
}
