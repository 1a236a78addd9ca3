//! One-shot checks used before a settings document exists: connection
//! tests and discovery of tables worth copying.

use crate::execution::factory;
use connectors::{
    document::base::store::StoreStats,
    sql::{base::metadata::table::KeyedTable, mssql::version::ServerVersion},
};
use engine_core::{error::SyncError, retry::RetryPolicy, schema::SchemaIntrospector};
use model::{
    core::schema::ColumnSchema,
    mapping::{SyncSettings, TableMapping, TableName},
    pagination::page_size::PageSize,
};
use tracing::info;

/// Connects to the source and reports its version, failing on engines that
/// cannot run the windowed page query.
pub async fn probe_source(conn_str: &str) -> Result<ServerVersion, SyncError> {
    let source = factory::connect_source(conn_str, 1).await?;
    let version = factory::verify_source_version(source.as_ref(), &RetryPolicy::none()).await?;
    info!(version = %version, "Source connection OK");
    Ok(version)
}

/// Pings the target and reads its storage statistics.
pub async fn probe_target(uri: &str) -> Result<StoreStats, SyncError> {
    let target = factory::connect_target(uri).await?;
    target
        .ping()
        .await
        .map_err(|e| SyncError::target_failure("ping", uri, e))?;
    let stats = target
        .stats()
        .await
        .map_err(|e| SyncError::target_failure("stats", uri, e))?;
    info!(database = %stats.database, data_size = stats.data_size, "Target connection OK");
    Ok(stats)
}

/// Tables that have a primary key, with their key column and row count.
pub async fn keyed_tables(conn_str: &str) -> Result<Vec<KeyedTable>, SyncError> {
    let source = factory::connect_source(conn_str, 1).await?;
    source
        .keyed_tables()
        .await
        .map_err(|e| SyncError::source_failure("keyed_tables", "sys.tables", e))
}

/// Column metadata of one source table, as a sync run would discover it.
pub async fn table_schema(conn_str: &str, table: &TableName) -> Result<ColumnSchema, SyncError> {
    let source = factory::connect_source(conn_str, 1).await?;
    SchemaIntrospector::new(source, RetryPolicy::default())
        .discover(table)
        .await
}

/// Settings with one selected mapping per keyed table, each copied into a
/// collection of the same name from scratch.
pub fn scaffold_settings(source: &str, target: &str, tables: &[KeyedTable]) -> SyncSettings {
    tables.iter().fold(SyncSettings::new(source, target), |settings, keyed| {
        settings.with_mapping(
            TableMapping::new(keyed.table.clone(), &keyed.table.name)
                .with_primary_key(&keyed.key_column)
                .with_page_size(PageSize::default()),
        )
    })
}
