use connectors::{
    document::base::error::StoreError,
    error::AdapterError,
    sql::base::error::{ConnectorError, DbError},
};
use model::mapping::SettingsError;
use planner::query::error::QueryError;
use std::error::Error;
use thiserror::Error;

type BoxError = Box<dyn Error + Send + Sync>;

/// Everything that can stop a sync run or one of its mappings.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required settings are missing or malformed. Aborts the whole run.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The source engine is older than the oldest supported release.
    #[error("Unsupported source version '{version}': SQL Server 2005 or later is required")]
    UnsupportedVersion { version: String },

    /// The table is missing or its metadata cannot be read.
    #[error("Schema error on table '{table}': {reason}")]
    Schema {
        table: String,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A source or target operation failed after all retries.
    #[error("Connection error during {operation} on '{target}': {source}")]
    Connection {
        operation: &'static str,
        target: String,
        #[source]
        source: BoxError,
    },

    /// A row no longer matches the schema discovered at the start of the run,
    /// or its ordinal would move the cursor backwards.
    #[error("Mapping error on table '{table}': {reason}")]
    Mapping { table: String, reason: String },

    /// A document collided with one already in the collection, which a
    /// retry cannot fix.
    #[error("Duplicate key in collection '{collection}': {message}")]
    DuplicateKey { collection: String, message: String },

    /// The target acknowledged a different number of documents than sent.
    #[error("Collection '{collection}' acknowledged {inserted} of {expected} documents")]
    LoadCountMismatch {
        collection: String,
        expected: usize,
        inserted: usize,
    },
}

impl SyncError {
    /// Run-scoped errors abort before any mapping is processed; every other
    /// error only fails the mapping it happened in.
    pub fn is_run_scoped(&self) -> bool {
        matches!(
            self,
            SyncError::Configuration(_) | SyncError::UnsupportedVersion { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Configuration(_) => "configuration",
            SyncError::UnsupportedVersion { .. } => "unsupported_version",
            SyncError::Schema { .. } => "schema",
            SyncError::Connection { .. } => "connection",
            SyncError::Mapping { .. } => "mapping",
            SyncError::DuplicateKey { .. } => "duplicate_key",
            SyncError::LoadCountMismatch { .. } => "load_count_mismatch",
        }
    }

    pub fn schema(table: &str, reason: impl Into<String>) -> Self {
        SyncError::Schema {
            table: table.to_string(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn mapping(table: &str, reason: impl Into<String>) -> Self {
        SyncError::Mapping {
            table: table.to_string(),
            reason: reason.into(),
        }
    }

    pub fn source_failure(operation: &'static str, table: &str, err: DbError) -> Self {
        SyncError::Connection {
            operation,
            target: table.to_string(),
            source: Box::new(err),
        }
    }

    pub fn target_failure(operation: &'static str, collection: &str, err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey {
                collection,
                message,
            } => SyncError::DuplicateKey {
                collection,
                message,
            },
            other => SyncError::Connection {
                operation,
                target: collection.to_string(),
                source: Box::new(other),
            },
        }
    }
}

impl From<SettingsError> for SyncError {
    fn from(err: SettingsError) -> Self {
        SyncError::Configuration(err.to_string())
    }
}

impl From<QueryError> for SyncError {
    fn from(err: QueryError) -> Self {
        let table = match &err {
            QueryError::UnknownColumn { table, .. } => table.clone(),
            QueryError::EmptySchema(table) | QueryError::NoOrderableColumn(table) => table.clone(),
        };
        SyncError::Schema {
            table,
            reason: err.to_string(),
            source: None,
        }
    }
}

impl From<ConnectorError> for SyncError {
    fn from(err: ConnectorError) -> Self {
        SyncError::Connection {
            operation: "connect",
            target: "source".to_string(),
            source: Box::new(err),
        }
    }
}

impl From<AdapterError> for SyncError {
    fn from(err: AdapterError) -> Self {
        let target = match &err {
            AdapterError::Store(_) => "target",
            _ => "source",
        };
        match err {
            AdapterError::MissingProperty(name) => {
                SyncError::Configuration(format!("missing connection property {name}"))
            }
            other => SyncError::Connection {
                operation: "connect",
                target: target.to_string(),
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_scoped_errors() {
        assert!(SyncError::Configuration("missing".into()).is_run_scoped());
        assert!(
            SyncError::UnsupportedVersion {
                version: "SQL Server 2000".into()
            }
            .is_run_scoped()
        );
        assert!(!SyncError::schema("Orders", "table does not exist").is_run_scoped());
        assert!(
            !SyncError::LoadCountMismatch {
                collection: "orders".into(),
                expected: 10,
                inserted: 8
            }
            .is_run_scoped()
        );
    }

    #[test]
    fn test_settings_errors_become_configuration() {
        let err: SyncError = SettingsError::MissingSourceConnection.into();
        assert_eq!(err.kind(), "configuration");
        assert!(err.to_string().contains("SQL Server connection string"));
    }

    #[test]
    fn test_query_errors_keep_table_context() {
        let err: SyncError = QueryError::NoOrderableColumn("Blobs".into()).into();
        match err {
            SyncError::Schema { table, .. } => assert_eq!(table, "Blobs"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_key_is_not_a_connection_error() {
        let err = SyncError::target_failure(
            "insert_batch",
            "orders",
            StoreError::DuplicateKey {
                collection: "orders".into(),
                message: "E11000 duplicate key error".into(),
            },
        );
        assert_eq!(err.kind(), "duplicate_key");
        assert!(!err.is_run_scoped());

        let err = SyncError::target_failure("clear", "orders", StoreError::MissingDatabase);
        assert_eq!(err.kind(), "connection");
    }

    #[test]
    fn test_mismatch_message() {
        let err = SyncError::LoadCountMismatch {
            collection: "orders".into(),
            expected: 10,
            inserted: 8,
        };
        assert_eq!(
            err.to_string(),
            "Collection 'orders' acknowledged 8 of 10 documents"
        );
    }
}
