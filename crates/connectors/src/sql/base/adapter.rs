use crate::sql::base::{
    error::{ConnectorError, DbError},
    metadata::table::KeyedTable,
};
use async_trait::async_trait;
use model::{core::schema::ColumnSchema, mapping::TableName, records::row::RowData};
use planner::query::page::PageQuery;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseKind {
    MsSql,
    Other(String),
}

/// Read-only access to a relational source.
#[async_trait]
pub trait SqlAdapter: Send + Sync {
    async fn connect(conn_str: &str) -> Result<Self, ConnectorError>
    where
        Self: Sized;

    /// Free-form version banner reported by the server.
    async fn server_version(&self) -> Result<String, DbError>;

    // Introspection
    async fn table_exists(&self, table: &TableName) -> Result<bool, DbError>;
    async fn table_schema(&self, table: &TableName) -> Result<ColumnSchema, DbError>;
    async fn keyed_tables(&self) -> Result<Vec<KeyedTable>, DbError>;

    /// Executes one windowed page query.
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<RowData>, DbError>;

    fn kind(&self) -> DatabaseKind;
}
