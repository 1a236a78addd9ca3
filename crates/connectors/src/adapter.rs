use crate::{
    document::{base::store::DocumentStore, mongo::store::MongoStore},
    error::AdapterError,
    sql::{base::adapter::SqlAdapter, mssql::adapter::MsSqlAdapter},
};
use std::sync::Arc;

/// Opens the relational source named by an ADO.NET style connection string,
/// pooling up to `max_connections` connections.
pub async fn connect_source(
    conn_str: &str,
    max_connections: usize,
) -> Result<Arc<dyn SqlAdapter>, AdapterError> {
    if conn_str.trim().is_empty() {
        return Err(AdapterError::MissingProperty("SQLConnection".to_string()));
    }
    let adapter = MsSqlAdapter::connect_pooled(conn_str, max_connections).await?;
    Ok(Arc::new(adapter))
}

/// Opens the document target named by a MongoDB URI.
pub async fn connect_target(uri: &str) -> Result<Arc<dyn DocumentStore>, AdapterError> {
    if uri.trim().is_empty() {
        return Err(AdapterError::MissingProperty("MongoConnection".to_string()));
    }
    let store = MongoStore::connect(uri).await?;
    Ok(Arc::new(store))
}
