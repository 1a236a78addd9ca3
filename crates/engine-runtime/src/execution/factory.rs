use connectors::{
    adapter,
    document::base::store::DocumentStore,
    sql::{
        base::{adapter::SqlAdapter, error::DbError},
        mssql::version::ServerVersion,
    },
};
use engine_core::{
    error::SyncError,
    retry::{RetryDisposition, RetryPolicy},
};
use std::sync::Arc;
use tracing::info;

pub async fn connect_source(
    conn_str: &str,
    max_connections: usize,
) -> Result<Arc<dyn SqlAdapter>, SyncError> {
    let source = adapter::connect_source(conn_str, max_connections).await?;
    info!(kind = ?source.kind(), max_connections, "Connected to source");
    Ok(source)
}

pub async fn connect_target(uri: &str) -> Result<Arc<dyn DocumentStore>, SyncError> {
    let target = adapter::connect_target(uri).await?;
    info!("Target client ready");
    Ok(target)
}

/// Reads `@@VERSION` and rejects engines that predate windowed ranking.
pub async fn verify_source_version(
    source: &dyn SqlAdapter,
    retry: &RetryPolicy,
) -> Result<ServerVersion, SyncError> {
    let banner = retry
        .run(
            "server_version",
            || source.server_version(),
            |e: &DbError| RetryDisposition::from_transient(e.is_transient()),
        )
        .await
        .map_err(|e| SyncError::source_failure("server_version", "@@VERSION", e.into_inner()))?;

    let version = ServerVersion::parse(&banner);
    if !version.is_supported() {
        return Err(SyncError::UnsupportedVersion {
            version: version.to_string(),
        });
    }
    Ok(version)
}
