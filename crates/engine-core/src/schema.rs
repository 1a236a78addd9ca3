use crate::{
    error::SyncError,
    retry::{RetryDisposition, RetryError, RetryPolicy},
};
use connectors::sql::base::{adapter::SqlAdapter, error::DbError};
use model::{core::schema::ColumnSchema, mapping::TableName, records::row::ROW_ID};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Reads column metadata of source tables from the catalog.
#[derive(Clone)]
pub struct SchemaIntrospector {
    source: Arc<dyn SqlAdapter>,
    retry: RetryPolicy,
}

impl SchemaIntrospector {
    pub fn new(source: Arc<dyn SqlAdapter>, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Columns of `table` in catalog order. An existing table without columns
    /// yields an empty schema, which callers treat as nothing to copy.
    #[instrument(skip(self), fields(table = %table))]
    pub async fn discover(&self, table: &TableName) -> Result<ColumnSchema, SyncError> {
        let exists = self
            .retry
            .run(
                "table_exists",
                || self.source.table_exists(table),
                |e: &DbError| RetryDisposition::from_transient(e.is_transient()),
            )
            .await
            .map_err(|e| metadata_error(table, "table_exists", e))?;

        if !exists {
            return Err(SyncError::schema(
                &table.to_string(),
                "table does not exist",
            ));
        }

        let schema = self
            .retry
            .run(
                "table_schema",
                || self.source.table_schema(table),
                |e: &DbError| RetryDisposition::from_transient(e.is_transient()),
            )
            .await
            .map_err(|e| metadata_error(table, "table_schema", e))?;

        if schema.contains(ROW_ID) {
            return Err(SyncError::schema(
                &table.to_string(),
                format!("column '{ROW_ID}' collides with the generated ordinal column"),
            ));
        }

        debug!(columns = schema.len(), "Schema discovered");
        Ok(schema)
    }
}

/// Exhausted retries mean the connection is the problem; anything the
/// server rejected outright means the metadata itself could not be read.
fn metadata_error(table: &TableName, operation: &'static str, err: RetryError<DbError>) -> SyncError {
    match err {
        RetryError::AttemptsExceeded { last, .. } => {
            SyncError::source_failure(operation, &table.to_string(), last)
        }
        RetryError::Fatal(err) => SyncError::Schema {
            table: table.to_string(),
            reason: "metadata could not be read".to_string(),
            source: Some(Box::new(err)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::sql::base::{
        adapter::DatabaseKind, error::ConnectorError, metadata::table::KeyedTable,
    };
    use model::records::row::RowData;
    use planner::query::page::PageQuery;
    use std::{
        io,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    struct CatalogStub {
        schema: Option<ColumnSchema>,
        transient_failures: AtomicUsize,
    }

    impl CatalogStub {
        fn with_table(schema: ColumnSchema) -> Self {
            Self {
                schema: Some(schema),
                transient_failures: AtomicUsize::new(0),
            }
        }

        fn empty() -> Self {
            Self {
                schema: None,
                transient_failures: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SqlAdapter for CatalogStub {
        async fn connect(_conn_str: &str) -> Result<Self, ConnectorError> {
            Ok(Self::empty())
        }

        async fn server_version(&self) -> Result<String, DbError> {
            Ok("Microsoft SQL Server 2019 (RTM) - 15.0.2000.5".into())
        }

        async fn table_exists(&self, _table: &TableName) -> Result<bool, DbError> {
            if self.transient_failures.load(Ordering::SeqCst) > 0 {
                self.transient_failures.fetch_sub(1, Ordering::SeqCst);
                return Err(DbError::Io(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset",
                )));
            }
            Ok(self.schema.is_some())
        }

        async fn table_schema(&self, table: &TableName) -> Result<ColumnSchema, DbError> {
            self.schema
                .clone()
                .ok_or_else(|| DbError::Metadata(format!("no columns for {table}")))
        }

        async fn keyed_tables(&self) -> Result<Vec<KeyedTable>, DbError> {
            Ok(Vec::new())
        }

        async fn fetch_page(&self, _query: &PageQuery) -> Result<Vec<RowData>, DbError> {
            Ok(Vec::new())
        }

        fn kind(&self) -> DatabaseKind {
            DatabaseKind::MsSql
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(1))
    }

    fn orders() -> TableName {
        TableName::new(None, "Orders")
    }

    #[tokio::test]
    async fn test_discover_returns_columns_in_catalog_order() {
        let schema = ColumnSchema::from_pairs(
            "dbo.Orders",
            &[("OrderID", "int"), ("Customer", "nvarchar"), ("Total", "money")],
        );
        let introspector =
            SchemaIntrospector::new(Arc::new(CatalogStub::with_table(schema)), policy());

        let discovered = introspector.discover(&orders()).await.unwrap();
        let names: Vec<&str> = discovered.names().collect();
        assert_eq!(names, vec!["OrderID", "Customer", "Total"]);
    }

    #[tokio::test]
    async fn test_missing_table_is_schema_error() {
        let introspector = SchemaIntrospector::new(Arc::new(CatalogStub::empty()), policy());
        let err = introspector.discover(&orders()).await.unwrap_err();
        assert_eq!(err.kind(), "schema");
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_row_id_column_is_rejected() {
        let schema =
            ColumnSchema::from_pairs("dbo.Orders", &[("OrderID", "int"), ("rowid", "bigint")]);
        let introspector =
            SchemaIntrospector::new(Arc::new(CatalogStub::with_table(schema)), policy());
        let err = introspector.discover(&orders()).await.unwrap_err();
        assert_eq!(err.kind(), "schema");
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let stub = CatalogStub::with_table(ColumnSchema::from_pairs(
            "dbo.Orders",
            &[("OrderID", "int")],
        ));
        stub.transient_failures.store(2, Ordering::SeqCst);
        let introspector = SchemaIntrospector::new(Arc::new(stub), policy());
        assert_eq!(introspector.discover(&orders()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_are_connection_errors() {
        let stub = CatalogStub::with_table(ColumnSchema::from_pairs(
            "dbo.Orders",
            &[("OrderID", "int")],
        ));
        stub.transient_failures.store(10, Ordering::SeqCst);
        let introspector = SchemaIntrospector::new(Arc::new(stub), policy());
        let err = introspector.discover(&orders()).await.unwrap_err();
        assert_eq!(err.kind(), "connection");
    }
}
